//! # Arbor Architecture
//!
//! Arbor is a **UI-agnostic outliner library**: a tree of rows (notes, todos,
//! projects) with typed attributes, undoable edits, bookmarks, live filtering
//! and a JSON document format. The `arbor` command line tool is one client of
//! it, not the application itself.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  UI (the arbor CLI, or any other client)                    │
//! │  - Parses input, renders rows, owns the terminal            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs) and Session (session.rs)                      │
//! │  - Open/save/backup, one transaction per command            │
//! │  - Undo log, bookmarks, active filter                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Outline store (store/)           Filter engine (filter/)   │
//! │  - Arena of rows, invariants      - Predicate, projection   │
//! │  - Change journal                 - Typeahead, background   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Persistence (persist/)                                     │
//! │  - Canonical document, migrations, backups                  │
//! │  - DocumentBackend: FsBackend (production), MemBackend      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! Apart from the backends and backups, code in this crate:
//! - Takes regular Rust arguments and returns `Result` values
//! - **Never** writes to stdout/stderr (diagnostics go through `tracing`)
//! - **Never** calls `std::process::exit`
//!
//! ## Module Overview
//!
//! - [`api`]: open, save, import, backup
//! - [`session`]: one open outline with history, references and filter
//! - [`store`]: the outline arena, change events and document backends
//! - [`history`]: undo/redo transactions
//! - [`registry`]: bookmarks and quick links
//! - [`filter`]: filter specs, query language, projection, background matching
//! - [`index`]: row paths (`2.1`), id prefixes and display rows
//! - [`persist`]: document format, migration, backups
//! - [`model`] and [`attributes`]: row attributes and their validation
//! - [`tags`], [`tasks`], [`links`]: tag markup, task workflow, row links
//! - [`plan`]: the flat plan view over planned rows
//! - [`config`] and [`init`]: configuration and startup
//! - [`error`]: error types

pub mod api;
pub mod attributes;
pub mod config;
pub mod error;
pub mod filter;
pub mod history;
pub mod index;
pub mod init;
pub mod links;
pub mod model;
pub mod persist;
pub mod plan;
pub mod registry;
pub mod session;
pub mod store;
pub mod tags;
pub mod tasks;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
