use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use super::change::{Change, SubtreeSnapshot};
use crate::attributes::AttrValue;
use crate::error::{ArborError, Result};
use crate::model::{NodeAttrs, NodeId};

#[derive(Debug, Clone)]
struct NodeRecord {
    attrs: NodeAttrs,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Store revision of the last change touching this node.
    version: u64,
}

/// The outline: a single-rooted tree of rows kept in an arena keyed by id.
///
/// The root is synthetic. It has no parent, cannot be deleted or moved, and
/// is not counted as a row.
///
/// Every successful mutation bumps [`revision`](Self::revision) and appends a
/// [`Change`] to the journal, which [`drain_changes`](Self::drain_changes)
/// hands to whoever records history. Failed mutations leave the store as it
/// was: all checks run before the first write.
#[derive(Debug, Clone)]
pub struct OutlineStore {
    root: NodeId,
    nodes: HashMap<NodeId, NodeRecord>,
    revision: u64,
    filter_revision: u64,
    journal: Vec<Change>,
}

impl Default for OutlineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for OutlineStore {
    /// Structural and attribute equality. Revisions and journals are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.nodes.len() == other.nodes.len()
            && self.nodes.iter().all(|(id, record)| {
                other.nodes.get(id).is_some_and(|theirs| {
                    record.attrs == theirs.attrs
                        && record.parent == theirs.parent
                        && record.children == theirs.children
                })
            })
    }
}

impl OutlineStore {
    pub fn new() -> Self {
        Self::with_root(NodeId::new(), NodeAttrs::default())
    }

    fn with_root(root: NodeId, attrs: NodeAttrs) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeRecord {
                attrs,
                parent: None,
                children: Vec::new(),
                version: 0,
            },
        );
        Self {
            root,
            nodes,
            revision: 0,
            filter_revision: 0,
            journal: Vec::new(),
        }
    }

    /// Rebuilds a store from a snapshot of a whole tree, keeping every id.
    ///
    /// Fails with [`ArborError::DuplicateNode`] if an id appears twice, or
    /// [`ArborError::InvalidValue`] if an attribute is out of range.
    pub fn from_snapshot(root: SubtreeSnapshot) -> Result<Self> {
        root.attrs.validate()?;
        let SubtreeSnapshot {
            id,
            attrs,
            children,
        } = root;
        let mut store = Self::with_root(id, attrs);
        for (position, child) in children.into_iter().enumerate() {
            store.check_restorable(&child)?;
            store.attach(id, position, child);
        }
        Ok(store)
    }

    // --- Reads ---

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Revision of the last mutation that could change what a filter matches.
    pub fn filter_revision(&self) -> u64 {
        self.filter_revision
    }

    /// Number of rows, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn record(&self, id: NodeId) -> Result<&NodeRecord> {
        self.nodes.get(&id).ok_or(ArborError::NodeNotFound(id))
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord> {
        self.nodes.get_mut(&id).ok_or(ArborError::NodeNotFound(id))
    }

    pub fn get(&self, id: NodeId) -> Result<&NodeAttrs> {
        self.record(id).map(|r| &r.attrs)
    }

    pub fn version(&self, id: NodeId) -> Result<u64> {
        self.record(id).map(|r| r.version)
    }

    pub fn children_of(&self, id: NodeId) -> Result<&[NodeId]> {
        self.record(id).map(|r| r.children.as_slice())
    }

    /// `None` only for the root.
    pub fn parent_of(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.record(id).map(|r| r.parent)
    }

    /// Path from the immediate parent up to the root, nearest first.
    pub fn ancestors_of(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(id)?;
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.record(parent)?.parent;
        }
        Ok(ancestors)
    }

    /// Index among the siblings. The root is at position 0.
    pub fn position_of(&self, id: NodeId) -> Result<usize> {
        match self.parent_of(id)? {
            None => Ok(0),
            Some(parent) => Ok(self
                .children_of(parent)?
                .iter()
                .position(|child| *child == id)
                .unwrap_or_default()),
        }
    }

    pub fn depth(&self, id: NodeId) -> Result<usize> {
        self.ancestors_of(id).map(|a| a.len())
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.nodes.get(&id).and_then(|r| r.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(&parent).and_then(|r| r.parent);
        }
        false
    }

    /// Every row in document order. The root is not included.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder::below(self, self.root)
    }

    /// Descendants of `id` in document order, `id` itself excluded.
    pub fn descendants(&self, id: NodeId) -> Result<Preorder<'_>> {
        self.record(id)?;
        Ok(Preorder::below(self, id))
    }

    /// Every effective tag in the tree, explicit and written in text.
    pub fn all_tags(&self) -> BTreeSet<String> {
        self.preorder()
            .filter_map(|id| self.nodes.get(&id))
            .flat_map(|record| record.attrs.effective_tags())
            .collect()
    }

    /// Deep copy of a subtree, ids included.
    pub fn snapshot(&self, id: NodeId) -> Result<SubtreeSnapshot> {
        let record = self.record(id)?;
        let children = record
            .children
            .iter()
            .map(|child| self.snapshot(*child))
            .collect::<Result<Vec<_>>>()?;
        Ok(SubtreeSnapshot {
            id,
            attrs: record.attrs.clone(),
            children,
        })
    }

    /// Takes the changes emitted since the last call.
    pub fn drain_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.journal)
    }

    /// Verifies the structural invariants, describing the first violation.
    pub fn check_integrity(&self) -> std::result::Result<(), String> {
        let root = self.record(self.root).map_err(|e| e.to_string())?;
        if root.parent.is_some() {
            return Err("root has a parent".into());
        }
        for (id, record) in &self.nodes {
            if *id != self.root {
                let parent = record.parent.ok_or(format!("{id} has no parent"))?;
                let siblings = &self
                    .nodes
                    .get(&parent)
                    .ok_or(format!("{id} points at missing parent {parent}"))?
                    .children;
                if siblings.iter().filter(|s| *s == id).count() != 1 {
                    return Err(format!("{id} is not listed exactly once by {parent}"));
                }
            }
            for child in &record.children {
                match self.nodes.get(child) {
                    Some(c) if c.parent == Some(*id) => {}
                    _ => return Err(format!("{id} lists {child} which is not its child")),
                }
            }
        }
        let reachable = 1 + self.preorder().take(self.nodes.len()).count();
        if reachable != self.nodes.len() {
            return Err(format!(
                "{} of {} nodes reachable from the root",
                reachable,
                self.nodes.len()
            ));
        }
        Ok(())
    }

    // --- Mutations ---

    /// Creates a row at `parent[position]`; later siblings shift right.
    pub fn insert(&mut self, parent: NodeId, position: usize, attrs: NodeAttrs) -> Result<NodeId> {
        check_position(position, self.children_of(parent)?.len())?;
        attrs.validate()?;
        let snapshot = SubtreeSnapshot::leaf(NodeId::new(), attrs);
        let id = snapshot.id;
        self.attach(parent, position, snapshot.clone());
        self.commit(Change::Inserted {
            parent,
            position,
            snapshot,
        });
        Ok(id)
    }

    /// Inserts as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, attrs: NodeAttrs) -> Result<NodeId> {
        let end = self.children_of(parent)?.len();
        self.insert(parent, end, attrs)
    }

    /// Puts a previously removed subtree back, ids included.
    pub fn restore_subtree(
        &mut self,
        parent: NodeId,
        position: usize,
        snapshot: SubtreeSnapshot,
    ) -> Result<()> {
        check_position(position, self.children_of(parent)?.len())?;
        self.check_restorable(&snapshot)?;
        self.attach(parent, position, snapshot.clone());
        self.commit(Change::Inserted {
            parent,
            position,
            snapshot,
        });
        Ok(())
    }

    /// Removes a row and its whole subtree, returning the removed ids in
    /// document order.
    pub fn delete(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let (parent, position) = self.locate(id, "deleted")?;
        let snapshot = self.snapshot(id)?;
        let removed = snapshot.ids();
        for gone in &removed {
            self.nodes.remove(gone);
        }
        self.record_mut(parent)?.children.remove(position);
        self.commit(Change::Deleted {
            parent,
            position,
            snapshot,
            removed: removed.clone(),
        });
        Ok(removed)
    }

    /// Reparents `id` to `new_parent[position]`.
    ///
    /// `position` indexes the new parent's children with `id` already taken
    /// out, so it is also the final index of `id`.
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId, position: usize) -> Result<()> {
        self.record(id)?;
        let target_len = self.children_of(new_parent)?.len();
        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(ArborError::CycleDetected {
                node: id,
                target: new_parent,
            });
        }
        let (from_parent, from_position) = self.locate(id, "moved")?;
        let max = if from_parent == new_parent {
            target_len - 1
        } else {
            target_len
        };
        check_position(position, max)?;
        if from_parent == new_parent && from_position == position {
            return Ok(());
        }

        self.record_mut(from_parent)?.children.remove(from_position);
        self.record_mut(new_parent)?.children.insert(position, id);
        self.record_mut(id)?.parent = Some(new_parent);
        self.commit(Change::Moved {
            id,
            from_parent,
            from_position,
            to_parent: new_parent,
            to_position: position,
        });
        Ok(())
    }

    /// Shifts a row among its siblings. Returns false when it is already at
    /// the boundary in that direction.
    pub fn reorder(&mut self, id: NodeId, delta: isize) -> Result<bool> {
        let Some(parent) = self.parent_of(id)? else {
            return Ok(false);
        };
        let position = self.position_of(id)?;
        let last = self.children_of(parent)?.len().saturating_sub(1);
        let target = position.saturating_add_signed(delta).min(last);
        if target == position {
            return Ok(false);
        }
        self.move_node(id, parent, target)?;
        Ok(true)
    }

    /// Makes a row the last child of its preceding sibling.
    /// Returns false if there is no preceding sibling.
    pub fn indent(&mut self, id: NodeId) -> Result<bool> {
        let Some(parent) = self.parent_of(id)? else {
            return Ok(false);
        };
        let position = self.position_of(id)?;
        let Some(previous) = position
            .checked_sub(1)
            .and_then(|p| self.children_of(parent).ok()?.get(p).copied())
        else {
            return Ok(false);
        };
        let end = self.children_of(previous)?.len();
        self.move_node(id, previous, end)?;
        Ok(true)
    }

    /// Makes a row the next sibling of its parent.
    /// Returns false if the parent is the root.
    pub fn outdent(&mut self, id: NodeId) -> Result<bool> {
        let Some(parent) = self.parent_of(id)? else {
            return Ok(false);
        };
        let Some(grandparent) = self.parent_of(parent)? else {
            return Ok(false);
        };
        let after_parent = self.position_of(parent)? + 1;
        self.move_node(id, grandparent, after_parent)?;
        Ok(true)
    }

    /// Validates and stores one attribute. Returns false, emitting nothing,
    /// when the value is unchanged.
    pub fn set_attribute(&mut self, id: NodeId, value: AttrValue) -> Result<bool> {
        value.validate()?;
        let record = self.record_mut(id)?;
        if record.attrs.get(value.field()) == value {
            return Ok(false);
        }
        let before = record.attrs.set(value.clone());
        self.commit(Change::AttributeSet {
            id,
            before,
            after: value,
        });
        Ok(true)
    }

    /// Replays a change, as undo and redo do.
    pub fn apply(&mut self, change: &Change) -> Result<()> {
        match change.clone() {
            Change::Inserted {
                parent,
                position,
                snapshot,
            } => self.restore_subtree(parent, position, snapshot),
            Change::Deleted { snapshot, .. } => self.delete(snapshot.id).map(drop),
            Change::Moved {
                id,
                to_parent,
                to_position,
                ..
            } => self.move_node(id, to_parent, to_position),
            Change::AttributeSet { id, after, .. } => self.set_attribute(id, after).map(drop),
        }
    }

    // --- Internals ---

    fn locate(&self, id: NodeId, action: &'static str) -> Result<(NodeId, usize)> {
        let parent = self.parent_of(id)?.ok_or(ArborError::RootNode(action))?;
        Ok((parent, self.position_of(id)?))
    }

    fn check_restorable(&self, snapshot: &SubtreeSnapshot) -> Result<()> {
        let mut seen = HashSet::new();
        let mut stack = vec![snapshot];
        while let Some(node) = stack.pop() {
            if self.nodes.contains_key(&node.id) || !seen.insert(node.id) {
                return Err(ArborError::DuplicateNode(node.id));
            }
            node.attrs.validate()?;
            stack.extend(node.children.iter());
        }
        Ok(())
    }

    /// Links a checked subtree in. Callers validate first.
    fn attach(&mut self, parent: NodeId, position: usize, snapshot: SubtreeSnapshot) {
        let SubtreeSnapshot {
            id,
            attrs,
            children,
        } = snapshot;
        self.nodes.insert(
            id,
            NodeRecord {
                attrs,
                parent: Some(parent),
                children: Vec::new(),
                version: self.revision + 1,
            },
        );
        if let Some(record) = self.nodes.get_mut(&parent) {
            record.children.insert(position, id);
        }
        for (index, child) in children.into_iter().enumerate() {
            self.attach(id, index, child);
        }
    }

    fn commit(&mut self, change: Change) {
        self.revision += 1;
        if change.affects_filter() {
            self.filter_revision = self.revision;
        }
        if let Some(record) = self.nodes.get_mut(&change.node_id()) {
            record.version = self.revision;
        }
        debug!(
            revision = self.revision,
            node = %change.node_id(),
            change = change.kind(),
            "outline changed"
        );
        self.journal.push(change);
    }
}

fn check_position(position: usize, max: usize) -> Result<()> {
    if position > max {
        return Err(ArborError::InvalidPosition { position, max });
    }
    Ok(())
}

/// Depth-first, document-order walk below a node.
pub struct Preorder<'a> {
    store: &'a OutlineStore,
    stack: Vec<NodeId>,
}

impl<'a> Preorder<'a> {
    fn below(store: &'a OutlineStore, id: NodeId) -> Self {
        let stack = store
            .nodes
            .get(&id)
            .map(|r| r.children.iter().rev().copied().collect())
            .unwrap_or_default();
        Self { store, stack }
    }
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Some(record) = self.store.nodes.get(&id) {
            self.stack.extend(record.children.iter().rev().copied());
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, RowKind};

    fn row(text: &str) -> NodeAttrs {
        NodeAttrs::new(text)
    }

    /// root -> [a -> [a1, a2], b]
    fn sample() -> (OutlineStore, NodeId, NodeId, NodeId, NodeId) {
        let mut store = OutlineStore::new();
        let root = store.root();
        let a = store.append(root, row("a")).unwrap();
        let b = store.append(root, row("b")).unwrap();
        let a1 = store.append(a, row("a1")).unwrap();
        let a2 = store.append(a, row("a2")).unwrap();
        store.drain_changes();
        (store, a, b, a1, a2)
    }

    fn texts(store: &OutlineStore, parent: NodeId) -> Vec<String> {
        store
            .children_of(parent)
            .unwrap()
            .iter()
            .map(|id| store.get(*id).unwrap().text.clone())
            .collect()
    }

    #[test]
    fn insert_at_front_shifts_siblings() {
        let (mut store, _, _, _, _) = sample();
        let root = store.root();
        store.insert(root, 0, row("x")).unwrap();
        assert_eq!(texts(&store, root), vec!["x", "a", "b"]);
    }

    #[test]
    fn insert_rejects_out_of_range_position() {
        let (mut store, _, _, _, _) = sample();
        let root = store.root();
        let err = store.insert(root, 3, row("x")).unwrap_err();
        assert!(matches!(
            err,
            ArborError::InvalidPosition {
                position: 3,
                max: 2
            }
        ));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn insert_under_missing_parent_fails() {
        let mut store = OutlineStore::new();
        let missing = NodeId::new();
        assert!(matches!(
            store.insert(missing, 0, row("x")),
            Err(ArborError::NodeNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn insert_validates_attributes() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let bad = row("x").with_tag("-nope");
        assert!(store.insert(root, 0, bad).is_err());
        assert!(store.is_empty());
        assert!(store.drain_changes().is_empty());
    }

    #[test]
    fn delete_cascades_and_reports_removed_ids() {
        let (mut store, a, b, a1, a2) = sample();
        let removed = store.delete(a).unwrap();
        assert_eq!(removed, vec![a, a1, a2]);
        assert!(!store.contains(a1));
        assert_eq!(store.children_of(store.root()).unwrap(), &[b]);
        assert!(store.check_integrity().is_ok());
    }

    #[test]
    fn root_cannot_be_deleted() {
        let mut store = OutlineStore::new();
        let root = store.root();
        assert!(matches!(
            store.delete(root),
            Err(ArborError::RootNode("deleted"))
        ));
    }

    #[test]
    fn move_into_own_descendant_is_a_cycle() {
        let (mut store, a, _, a1, _) = sample();
        let before = store.clone();
        let err = store.move_node(a, a1, 0).unwrap_err();
        assert!(matches!(err, ArborError::CycleDetected { .. }));
        assert!(matches!(
            store.move_node(a, a, 0),
            Err(ArborError::CycleDetected { .. })
        ));
        assert_eq!(store, before);
        assert_eq!(store.revision(), before.revision());
    }

    #[test]
    fn move_between_parents() {
        let (mut store, a, b, a1, a2) = sample();
        store.move_node(a2, b, 0).unwrap();
        assert_eq!(store.children_of(a).unwrap(), &[a1]);
        assert_eq!(store.children_of(b).unwrap(), &[a2]);
        assert_eq!(store.parent_of(a2).unwrap(), Some(b));
    }

    #[test]
    fn move_within_parent_uses_final_index() {
        let (mut store, _, _, _, _) = sample();
        let root = store.root();
        let c = store.append(root, row("c")).unwrap();
        store.move_node(c, root, 0).unwrap();
        assert_eq!(texts(&store, root), vec!["c", "a", "b"]);
        assert!(matches!(
            store.move_node(c, root, 3),
            Err(ArborError::InvalidPosition { max: 2, .. })
        ));
    }

    #[test]
    fn reorder_is_noop_at_boundaries() {
        let (mut store, a, b, _, _) = sample();
        let root = store.root();
        assert!(!store.reorder(a, -1).unwrap());
        assert!(!store.reorder(b, 1).unwrap());
        assert!(store.reorder(a, 1).unwrap());
        assert_eq!(texts(&store, root), vec!["b", "a"]);
    }

    #[test]
    fn indent_and_outdent() {
        let (mut store, a, b, a1, a2) = sample();
        assert!(!store.indent(a).unwrap());
        assert!(!store.indent(a1).unwrap());

        assert!(store.indent(b).unwrap());
        assert_eq!(store.children_of(a).unwrap(), &[a1, a2, b]);

        assert!(store.indent(a2).unwrap());
        assert_eq!(store.children_of(a1).unwrap(), &[a2]);

        assert!(store.outdent(a2).unwrap());
        assert_eq!(store.children_of(a).unwrap(), &[a1, a2, b]);
        assert!(!store.outdent(a).unwrap());
    }

    #[test]
    fn set_attribute_is_idempotent() {
        let (mut store, a, _, _, _) = sample();
        assert!(store
            .set_attribute(a, AttrValue::Color(Color::Red))
            .unwrap());
        let revision = store.revision();
        assert!(!store
            .set_attribute(a, AttrValue::Color(Color::Red))
            .unwrap());
        assert_eq!(store.revision(), revision);
        assert_eq!(store.drain_changes().len(), 1);
    }

    #[test]
    fn set_attribute_rejects_invalid_values() {
        let (mut store, a, _, _, _) = sample();
        let err = store
            .set_attribute(a, AttrValue::Estimate(Some(u32::MAX)))
            .unwrap_err();
        assert!(matches!(err, ArborError::InvalidValue { .. }));
        assert_eq!(store.get(a).unwrap().estimate, None);
    }

    #[test]
    fn view_state_does_not_bump_filter_revision() {
        let (mut store, a, _, _, _) = sample();
        let filter_revision = store.filter_revision();
        store.set_attribute(a, AttrValue::Collapsed(true)).unwrap();
        assert_eq!(store.filter_revision(), filter_revision);
        store
            .set_attribute(a, AttrValue::Kind(RowKind::Todo))
            .unwrap();
        assert_eq!(store.filter_revision(), store.revision());
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let (store, a, _, a1, _) = sample();
        assert_eq!(store.ancestors_of(a1).unwrap(), vec![a, store.root()]);
        assert!(store.ancestors_of(store.root()).unwrap().is_empty());
        assert_eq!(store.depth(a1).unwrap(), 2);
    }

    #[test]
    fn preorder_is_document_order() {
        let (store, a, b, a1, a2) = sample();
        assert_eq!(store.preorder().collect::<Vec<_>>(), vec![a, a1, a2, b]);
        assert_eq!(
            store.descendants(a).unwrap().collect::<Vec<_>>(),
            vec![a1, a2]
        );
    }

    #[test]
    fn applying_inverse_changes_restores_state() {
        let (mut store, a, b, _, a2) = sample();
        let before = store.clone();
        store.delete(a).unwrap();
        store.set_attribute(b, AttrValue::Text("bee".into())).unwrap();
        let changes = store.drain_changes();
        for change in changes.iter().rev() {
            store.apply(&change.inverse()).unwrap();
        }
        assert_eq!(store, before);
        assert!(store.contains(a2));
    }

    #[test]
    fn restore_rejects_existing_ids() {
        let (mut store, a, _, _, _) = sample();
        let snapshot = store.snapshot(a).unwrap();
        let root = store.root();
        assert!(matches!(
            store.restore_subtree(root, 0, snapshot),
            Err(ArborError::DuplicateNode(id)) if id == a
        ));
    }

    #[test]
    fn from_snapshot_roundtrip() {
        let (store, _, _, _, _) = sample();
        let copy = OutlineStore::from_snapshot(store.snapshot(store.root()).unwrap()).unwrap();
        assert_eq!(copy, store);
        assert!(copy.check_integrity().is_ok());
    }

    #[test]
    fn all_tags_includes_text_tags() {
        let mut store = OutlineStore::new();
        let root = store.root();
        store.append(root, row("call :phone")).unwrap();
        store.append(root, row("x").with_tag("work")).unwrap();
        let tags: Vec<_> = store.all_tags().into_iter().collect();
        assert_eq!(tags, vec!["phone", "work"]);
    }
}
