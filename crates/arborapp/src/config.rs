//! # Configuration
//!
//! Arbor configuration is managed by [`clapfig`], which handles layered
//! loading from TOML files, environment variables, and programmatic overrides.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `ARBOR__BACKUP_INTERVAL_MINUTES`, `ARBOR__UNDO_CAPACITY`, etc.
//! 2. **Working directory**: `.arbor/arbor.toml`, if present.
//! 3. **Data directory**: `arbor.toml` next to the document.
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `backup_interval_minutes` | `0` | Minutes between automatic backups; `0` disables them |
//! | `backup_folder` | `<data dir>/backups` | Where backups are written |
//! | `undo_capacity` | `200` | Undo steps kept per session |
//! | `document_name` | `tree.json` | File name of the outline in the data directory |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "arbor.toml";
const DEFAULT_DOCUMENT_NAME: &str = "tree.json";
const BACKUP_DIR: &str = "backups";

/// Configuration for arbor, stored in `arbor.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArborConfig {
    /// Minutes between automatic backups. 0 disables them.
    #[config(default = 0)]
    pub backup_interval_minutes: u32,

    /// Folder for backups. When absent, `backups/` inside the data directory.
    pub backup_folder: Option<PathBuf>,

    /// Number of undo steps kept in memory.
    #[config(default = 200)]
    pub undo_capacity: usize,

    /// File name of the outline document inside the data directory.
    #[config(default = "tree.json")]
    pub document_name: String,
}

impl Default for ArborConfig {
    fn default() -> Self {
        Self {
            backup_interval_minutes: 0,
            backup_folder: None,
            undo_capacity: crate::history::DEFAULT_UNDO_CAPACITY,
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
        }
    }
}

impl ArborConfig {
    /// The configured backup folder, or the default under `data_dir`.
    pub fn backup_folder(&self, data_dir: &Path) -> PathBuf {
        self.backup_folder
            .clone()
            .unwrap_or_else(|| data_dir.join(BACKUP_DIR))
    }

    /// The document name, falling back to the default if blank.
    pub fn document_name(&self) -> &str {
        match self.document_name.trim() {
            "" => DEFAULT_DOCUMENT_NAME,
            name => name,
        }
    }
}
