//! # Bookmarks and Quick Links
//!
//! Named shortcuts to rows, kept in two ordered lists. An entry holds only the
//! target's id: it never owns the row and is resolved by lookup.
//!
//! ## Consistency
//!
//! - `add` and `rename` check that the target exists at call time
//! - when rows are deleted, [`ReferenceRegistry::purge`] drops every entry
//!   pointing into the deleted set, so entries never dangle
//! - inline links written in row text are not tracked here, see
//!   [`crate::links`]

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::error::{ArborError, Result};
use crate::model::NodeId;
use crate::store::OutlineStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    pub label: String,
    pub target_id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Bookmark,
    QuickLink,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Bookmark => f.write_str("bookmark"),
            RefKind::QuickLink => f.write_str("quick link"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceRegistry {
    bookmarks: Vec<RefEntry>,
    quick_links: Vec<RefEntry>,
    /// Bumped by every change, so callers can tell unsaved edits apart.
    revision: u64,
}

impl PartialEq for ReferenceRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.bookmarks == other.bookmarks && self.quick_links == other.quick_links
    }
}

impl Eq for ReferenceRegistry {}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from stored lists, dropping entries whose target is
    /// not in `store`.
    pub fn from_entries(
        bookmarks: Vec<RefEntry>,
        quick_links: Vec<RefEntry>,
        store: &OutlineStore,
    ) -> (Self, Vec<RefEntry>) {
        let (bookmarks, mut dropped): (Vec<_>, Vec<_>) = bookmarks
            .into_iter()
            .partition(|e| store.contains(e.target_id));
        let (quick_links, dropped_links): (Vec<_>, Vec<_>) = quick_links
            .into_iter()
            .partition(|e| store.contains(e.target_id));
        dropped.extend(dropped_links);
        (
            Self {
                bookmarks,
                quick_links,
                revision: 0,
            },
            dropped,
        )
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entries(&self, kind: RefKind) -> &[RefEntry] {
        match kind {
            RefKind::Bookmark => &self.bookmarks,
            RefKind::QuickLink => &self.quick_links,
        }
    }

    fn list_mut(&mut self, kind: RefKind) -> &mut Vec<RefEntry> {
        match kind {
            RefKind::Bookmark => &mut self.bookmarks,
            RefKind::QuickLink => &mut self.quick_links,
        }
    }

    fn not_found(kind: RefKind, position: usize) -> ArborError {
        ArborError::ReferenceNotFound(format!("{kind} #{position}"))
    }

    /// Appends an entry, returning its position.
    pub fn add(
        &mut self,
        kind: RefKind,
        label: impl Into<String>,
        target_id: NodeId,
        store: &OutlineStore,
    ) -> Result<usize> {
        if !store.contains(target_id) {
            return Err(ArborError::NodeNotFound(target_id));
        }
        let list = self.list_mut(kind);
        list.push(RefEntry {
            label: label.into(),
            target_id,
        });
        let position = list.len() - 1;
        self.revision += 1;
        Ok(position)
    }

    /// Relabels an entry. Fails if its target no longer exists.
    pub fn rename(
        &mut self,
        kind: RefKind,
        position: usize,
        label: impl Into<String>,
        store: &OutlineStore,
    ) -> Result<()> {
        let entry = self
            .list_mut(kind)
            .get_mut(position)
            .ok_or_else(|| Self::not_found(kind, position))?;
        if !store.contains(entry.target_id) {
            return Err(ArborError::NodeNotFound(entry.target_id));
        }
        entry.label = label.into();
        self.revision += 1;
        Ok(())
    }

    pub fn remove(&mut self, kind: RefKind, position: usize) -> Result<RefEntry> {
        let list = self.list_mut(kind);
        if position >= list.len() {
            return Err(Self::not_found(kind, position));
        }
        let entry = list.remove(position);
        self.revision += 1;
        Ok(entry)
    }

    /// Moves the entry at `from` so it ends up at `to`.
    pub fn reorder(&mut self, kind: RefKind, from: usize, to: usize) -> Result<()> {
        let list = self.list_mut(kind);
        let max = list.len().saturating_sub(1);
        if from >= list.len() {
            return Err(Self::not_found(kind, from));
        }
        if to > max {
            return Err(ArborError::InvalidPosition { position: to, max });
        }
        let entry = list.remove(from);
        list.insert(to, entry);
        self.revision += 1;
        Ok(())
    }

    /// Position of the first entry with `label`.
    pub fn find(&self, kind: RefKind, label: &str) -> Option<usize> {
        self.entries(kind).iter().position(|e| e.label == label)
    }

    pub fn resolve(&self, kind: RefKind, position: usize, store: &OutlineStore) -> Result<NodeId> {
        let entry = self
            .entries(kind)
            .get(position)
            .ok_or_else(|| Self::not_found(kind, position))?;
        if store.contains(entry.target_id) {
            Ok(entry.target_id)
        } else {
            Err(ArborError::NodeNotFound(entry.target_id))
        }
    }

    /// Drops every entry targeting one of `removed`. Returns how many went.
    pub fn purge(&mut self, removed: &[NodeId]) -> usize {
        if removed.is_empty() {
            return 0;
        }
        let removed: HashSet<&NodeId> = removed.iter().collect();
        let before = self.bookmarks.len() + self.quick_links.len();
        self.bookmarks.retain(|e| !removed.contains(&e.target_id));
        self.quick_links.retain(|e| !removed.contains(&e.target_id));
        let purged = before - self.bookmarks.len() - self.quick_links.len();
        if purged > 0 {
            self.revision += 1;
            debug!(purged, "dropped references to deleted rows");
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeAttrs;

    fn setup() -> (OutlineStore, NodeId, NodeId, NodeId) {
        let mut store = OutlineStore::new();
        let root = store.root();
        let a = store.append(root, NodeAttrs::new("a")).unwrap();
        let a1 = store.append(a, NodeAttrs::new("a1")).unwrap();
        let b = store.append(root, NodeAttrs::new("b")).unwrap();
        (store, a, a1, b)
    }

    #[test]
    fn add_checks_target_exists() {
        let (store, a, _, _) = setup();
        let mut registry = ReferenceRegistry::new();
        assert_eq!(registry.add(RefKind::Bookmark, "A", a, &store).unwrap(), 0);
        let missing = NodeId::new();
        assert!(matches!(
            registry.add(RefKind::Bookmark, "gone", missing, &store),
            Err(ArborError::NodeNotFound(_))
        ));
        assert_eq!(registry.entries(RefKind::Bookmark).len(), 1);
        assert!(registry.entries(RefKind::QuickLink).is_empty());
    }

    #[test]
    fn purge_removes_entries_in_deleted_subtree() {
        let (mut store, a, a1, b) = setup();
        let mut registry = ReferenceRegistry::new();
        registry.add(RefKind::Bookmark, "A", a, &store).unwrap();
        registry.add(RefKind::QuickLink, "A1", a1, &store).unwrap();
        registry.add(RefKind::Bookmark, "B", b, &store).unwrap();

        let removed = store.delete(a).unwrap();
        assert_eq!(registry.purge(&removed), 2);
        assert_eq!(registry.entries(RefKind::Bookmark)[0].target_id, b);
        assert!(registry.entries(RefKind::QuickLink).is_empty());
    }

    #[test]
    fn rename_remove_and_reorder() {
        let (store, a, a1, b) = setup();
        let mut registry = ReferenceRegistry::new();
        for (label, id) in [("A", a), ("A1", a1), ("B", b)] {
            registry.add(RefKind::QuickLink, label, id, &store).unwrap();
        }
        registry.rename(RefKind::QuickLink, 1, "child", &store).unwrap();
        registry.reorder(RefKind::QuickLink, 2, 0).unwrap();
        let labels: Vec<_> = registry
            .entries(RefKind::QuickLink)
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(labels, vec!["B", "A", "child"]);

        assert_eq!(registry.remove(RefKind::QuickLink, 0).unwrap().target_id, b);
        assert!(matches!(
            registry.remove(RefKind::QuickLink, 5),
            Err(ArborError::ReferenceNotFound(_))
        ));
        assert!(matches!(
            registry.reorder(RefKind::QuickLink, 0, 2),
            Err(ArborError::InvalidPosition { position: 2, max: 1 })
        ));
        assert_eq!(registry.find(RefKind::QuickLink, "child"), Some(1));
    }

    #[test]
    fn rename_fails_for_vanished_target() {
        let (mut store, a, _, _) = setup();
        let mut registry = ReferenceRegistry::new();
        registry.add(RefKind::Bookmark, "A", a, &store).unwrap();
        store.delete(a).unwrap();
        assert!(matches!(
            registry.rename(RefKind::Bookmark, 0, "x", &store),
            Err(ArborError::NodeNotFound(id)) if id == a
        ));
        assert!(registry.resolve(RefKind::Bookmark, 0, &store).is_err());
    }

    #[test]
    fn only_successful_edits_bump_the_revision() {
        let (store, a, _, _) = setup();
        let mut registry = ReferenceRegistry::new();
        registry.add(RefKind::Bookmark, "A", a, &store).unwrap();
        let after_add = registry.revision();
        assert!(after_add > 0);
        assert!(registry.remove(RefKind::Bookmark, 3).is_err());
        assert_eq!(registry.purge(&[NodeId::new()]), 0);
        assert_eq!(registry.revision(), after_add);
    }

    #[test]
    fn from_entries_drops_dangling() {
        let (store, a, _, _) = setup();
        let missing = NodeId::new();
        let entries = vec![
            RefEntry {
                label: "ok".into(),
                target_id: a,
            },
            RefEntry {
                label: "gone".into(),
                target_id: missing,
            },
        ];
        let (registry, dropped) = ReferenceRegistry::from_entries(entries, Vec::new(), &store);
        assert_eq!(registry.entries(RefKind::Bookmark).len(), 1);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].label, "gone");
    }
}
