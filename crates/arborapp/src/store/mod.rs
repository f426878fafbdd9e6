//! # Storage Layer
//!
//! Two halves live here:
//!
//! 1. **The outline itself**: [`OutlineStore`] owns every row, its attributes
//!    and its place in the tree. It is in-memory and synchronous; nothing in
//!    it performs I/O.
//! 2. **Raw document I/O**: [`DocumentBackend`] moves the serialized document
//!    in and out of durable storage. The codec in [`crate::persist`] sits
//!    between the two.
//!
//! ## Arena Layout
//!
//! Rows are records in a map keyed by [`crate::model::NodeId`]. Each record
//! holds its parent id and an ordered child id list, so:
//!
//! - bookmarks and links store ids and resolve by lookup, never by reference
//! - a move rewrites two child lists and one parent pointer
//! - a delete removes a subtree's records in one step
//!
//! ## Invariants
//!
//! - Single synthetic root, the only record without a parent
//! - Acyclic: a move under the node itself or one of its descendants fails
//!   with [`crate::error::ArborError::CycleDetected`]
//! - Child order is the order of the child list; positions are always dense
//! - A failing operation changes nothing
//!
//! ## Change Events
//!
//! Every successful mutation appends a [`Change`] to the store's journal. The
//! session drains it after each command to record undo history, purge
//! bookmarks of deleted rows and decide whether the filter projection is stale.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: a JSON file on disk, written atomically
//! - [`mem_backend::MemBackend`]: in-memory, for tests

pub mod backend;
pub mod change;
pub mod fs_backend;
pub mod mem_backend;
mod outline;

pub use backend::DocumentBackend;
pub use change::{Change, SubtreeSnapshot};
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use outline::{OutlineStore, Preorder};
