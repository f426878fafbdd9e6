//! # Data Directory and Startup
//!
//! The outline document, its `arbor.toml` and (by default) its backups live
//! in one data directory, resolved in this order:
//!
//! 1. An explicit override (the CLI's `--data` flag)
//! 2. The `ARBOR_DATA` environment variable
//! 3. The OS-appropriate data directory (via the `directories` crate)
//!
//! Configuration is read from the data directory and then from `.arbor/` in
//! the working directory, merged so the working directory wins. See
//! [`crate::config`].

use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::api::ArborApi;
use crate::config::{ArborConfig, CONFIG_FILE_NAME};
use crate::error::{ArborError, Result};
use crate::store::FsBackend;

pub const DATA_ENV: &str = "ARBOR_DATA";
pub const LOCAL_CONFIG_DIR: &str = ".arbor";

pub struct ArborContext {
    pub api: ArborApi<FsBackend>,
    pub config: ArborConfig,
    pub data_dir: PathBuf,
}

pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_override {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(DATA_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "arbor", "arbor")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ArborError::Config("could not determine a data directory".into()))
}

/// Search paths for `arbor.toml`, lowest priority first.
pub fn config_search_paths(data_dir: &Path, cwd: &Path) -> Vec<SearchPath> {
    vec![
        SearchPath::Path(data_dir.to_path_buf()),
        SearchPath::Path(cwd.join(LOCAL_CONFIG_DIR)),
    ]
}

pub fn load_config(data_dir: &Path, cwd: &Path) -> Result<ArborConfig> {
    Clapfig::builder()
        .app_name("arbor")
        .file_name(CONFIG_FILE_NAME)
        .search_paths(config_search_paths(data_dir, cwd))
        .search_mode(SearchMode::Merge)
        .load()
        .map_err(|e| ArborError::Config(e.to_string()))
}

/// Resolves the data directory, loads configuration and opens the outline.
pub fn initialize(cwd: &Path, data_override: Option<PathBuf>) -> Result<ArborContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let config = load_config(&data_dir, cwd)?;
    debug!(data_dir = %data_dir.display(), ?config, "initializing");

    let backend = FsBackend::in_dir(&data_dir, config.document_name());
    let api = ArborApi::open(backend, &config, config.backup_folder(&data_dir))?;
    Ok(ArborContext {
        api,
        config,
        data_dir,
    })
}
