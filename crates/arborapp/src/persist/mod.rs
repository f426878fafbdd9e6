//! # Persistence
//!
//! The outline is stored as one JSON document: a root row with nested
//! children, plus the bookmark and quick-link lists.
//!
//! ```json
//! {
//!   "version": 3,
//!   "root": {
//!     "id": "…", "text": "", "type": "note", "color": "no_color",
//!     "estimate_minutes": null, "start_date": null, "tags": [],
//!     "repeat": null, "link": null, "collapsed": false,
//!     "children": [ … ]
//!   },
//!   "bookmarks": [ { "label": "…", "target_id": "…" } ],
//!   "quick_links": []
//! }
//! ```
//!
//! ## Layers
//!
//! - [`codec`]: store ⇄ [`Document`] (`export` / `import`) and document ⇄ JSON
//! - [`migrate`]: lifts older schema versions one step at a time
//! - [`backup`]: timed copies into a backup folder, written off-thread
//!
//! Ids are part of the format. Import never invents or rewrites them, so
//! bookmarks stored alongside stay valid.
//!
//! ## Loading
//!
//! [`load`] separates "nothing stored yet" from "stored but unreadable": the
//! first yields a fresh, empty outline, the second is
//! [`crate::error::ArborError::MalformedDocument`] and never silently replaces
//! the user's data.

pub mod backup;
pub mod codec;
pub mod document;
pub mod migrate;

pub use backup::{spawn_backup, BackupScheduler};
pub use codec::{export, from_json, import, to_json};
pub use document::{Document, NodeObject, CURRENT_VERSION};

use tracing::info;

use crate::error::Result;
use crate::registry::ReferenceRegistry;
use crate::store::{DocumentBackend, OutlineStore};

/// Reads the outline from `backend`.
pub fn load(backend: &impl DocumentBackend) -> Result<(OutlineStore, ReferenceRegistry)> {
    match backend.load()? {
        None => {
            info!(location = %backend.location().display(), "no document yet, starting empty");
            Ok((OutlineStore::new(), ReferenceRegistry::new()))
        }
        Some(text) => {
            let loaded = import(from_json(&text)?)?;
            info!(
                location = %backend.location().display(),
                rows = loaded.0.len(),
                "document loaded"
            );
            Ok(loaded)
        }
    }
}

/// Writes the outline to `backend`.
pub fn save(
    backend: &impl DocumentBackend,
    store: &OutlineStore,
    registry: &ReferenceRegistry,
) -> Result<()> {
    backend.save(&to_json(&export(store, registry)?)?)?;
    info!(location = %backend.location().display(), rows = store.len(), "document saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeAttrs;
    use crate::store::MemBackend;

    #[test]
    fn missing_document_starts_empty() {
        let (store, registry) = load(&MemBackend::new()).unwrap();
        assert!(store.is_empty());
        assert_eq!(registry, ReferenceRegistry::new());
    }

    #[test]
    fn corrupt_document_is_reported() {
        let backend = MemBackend::with_content("{\"version\": 3, \"root\": 42}");
        assert!(load(&backend).unwrap_err().is_malformed());
    }

    #[test]
    fn save_then_load() {
        let backend = MemBackend::new();
        let mut store = OutlineStore::new();
        let root = store.root();
        store.append(root, NodeAttrs::new("a")).unwrap();
        save(&backend, &store, &ReferenceRegistry::new()).unwrap();

        let (back, _) = load(&backend).unwrap();
        assert_eq!(back, store);
        assert_eq!(backend.save_count(), 1);
    }

    #[test]
    fn failed_write_is_an_error() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);
        assert!(save(&backend, &OutlineStore::new(), &ReferenceRegistry::new()).is_err());
    }
}
