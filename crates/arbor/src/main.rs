//! # Arbor CLI Architecture
//!
//! Arbor ships with a command line client, but the binary is intentionally thin:
//! the CLI lives in `src/cli/`, while this file only invokes `cli::run()` and
//! handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/arborapp/`: the outliner library (store, undo, filters, persistence)
//! - `crates/arbor/`: this CLI tool, depends on `arborapp`
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/arbor/src/cli/)                          │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Command dispatch and save/backup (commands.rs)           │
//! │  - Terminal rendering (render.rs, styles.rs)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (arborapp::api, arborapp::session)               │
//! │  - Opens and saves the outline                              │
//! │  - One undoable transaction per edit                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from `arborapp::api` inward is UI agnostic. The CLI layer owns
//! every user-facing concern: argument parsing, logging setup, dispatch, error
//! messages and rendering.
//!
//! ## One Command Per Process
//!
//! Each invocation opens the outline, applies a single command, saves if
//! anything changed and runs a backup if one is due. Undo history lives only
//! as long as the process, so the CLI has no undo command.
//!
//! ## Testing Approach
//!
//! - **Rendering (`src/cli/render.rs`)**: unit tests feed rows and compare the
//!   plain text output.
//! - **End to end (`tests/`)**: `assert_cmd` runs the binary against a
//!   temporary data directory passed with `--data`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
