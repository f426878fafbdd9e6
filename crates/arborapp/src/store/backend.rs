use crate::error::Result;
use std::path::PathBuf;

/// Abstract interface for raw document I/O.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// [`crate::persist`] handles the "what" (schema, migration, validation).
pub trait DocumentBackend {
    /// Read the stored document text.
    /// Returns Ok(None) if nothing was saved yet.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored document.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn save(&self, content: &str) -> Result<()>;

    /// Where the document lives. A virtual path for in-memory backends.
    fn location(&self) -> PathBuf;
}
