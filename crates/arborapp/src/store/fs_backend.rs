use super::backend::DocumentBackend;
use crate::error::{ArborError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores the document as a single JSON file.
pub struct FsBackend {
    path: PathBuf,
}

impl FsBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/<document_name>`
    pub fn in_dir(data_dir: &Path, document_name: &str) -> Self {
        Self::new(data_dir.join(document_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentBackend for FsBackend {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ArborError::Io(e)),
        }
    }

    fn save(&self, content: &str) -> Result<()> {
        write_atomic(&self.path, content)
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

/// Writes `content` to a temp file next to `path`, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(ArborError::Io)?;
    }
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_file = dir.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));
    fs::write(&tmp_file, content).map_err(ArborError::Io)?;
    if let Err(e) = fs::rename(&tmp_file, path) {
        let _ = fs::remove_file(&tmp_file);
        return Err(ArborError::Io(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::in_dir(dir.path(), "tree.json");
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn save_creates_directories_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::new(dir.path().join("nested/deeper/tree.json"));
        backend.save("{}").unwrap();
        backend.save("{\"version\":3}").unwrap();

        assert_eq!(backend.load().unwrap().as_deref(), Some("{\"version\":3}"));
        let entries: Vec<_> = fs::read_dir(dir.path().join("nested/deeper"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("tree.json")]);
    }
}
