use super::backend::DocumentBackend;
use crate::error::{ArborError, Result};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

/// In-memory document backend for testing.
///
/// Uses `RefCell` for interior mutability since a session is single-threaded.
/// This keeps the `DocumentBackend` trait on `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    content: RefCell<Option<String>>,
    saves: Cell<usize>,
    simulate_write_error: Cell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that already holds `content`, e.g. a legacy document.
    pub fn with_content(content: impl Into<String>) -> Self {
        let backend = Self::default();
        *backend.content.borrow_mut() = Some(content.into());
        backend
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn content(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl DocumentBackend for MemBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.content.borrow().clone())
    }

    fn save(&self, content: &str) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(ArborError::Io(std::io::Error::other("Simulated write error")));
        }
        *self.content.borrow_mut() = Some(content.to_string());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory://tree.json")
    }
}
