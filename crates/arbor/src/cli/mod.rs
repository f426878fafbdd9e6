//! # CLI Behavior
//!
//! This is **one possible UI client** for arbor, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and output formatting.
//!
//! For the overall architecture, see the crate-level documentation in [`crate`].
//!
//! ## Naked Execution (`arbor`)
//!
//! Running `arbor` with no arguments shows the whole outline, like `arbor show`.
//!
//! ## Addressing Rows
//!
//! Every command that takes a row accepts:
//!
//! - A path as printed by `show`: `2` is the second top-level row, `2.1` its first child
//! - A row id, or at least four leading characters of it (`show --ids` prints them)
//!
//! ## Filtering
//!
//! `show` takes the same search syntax as the library (`--query ":work c=r"`)
//! plus one flag per filter dimension. Flags win over the query. Rows that
//! only lead to a match are printed dimmed.
//!
//! ## Module Structure
//!
//! - `commands`: dispatch, save/backup, and the `config` subcommand
//! - `render`: output formatting (rows, references, messages)
//! - `setup`: argument parsing via clap, help text
//! - `styles`: terminal styling constants

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
