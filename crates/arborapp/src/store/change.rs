//! Change events emitted by [`super::OutlineStore`] mutations.
//!
//! Every variant carries enough to be inverted without consulting the store:
//! deletions keep the removed subtree verbatim (ids included) and attribute
//! sets keep both values.

use crate::attributes::{AttrField, AttrValue};
use crate::model::{NodeAttrs, NodeId};

/// A node and its descendants, detached from any store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeSnapshot {
    pub id: NodeId,
    pub attrs: NodeAttrs,
    pub children: Vec<SubtreeSnapshot>,
}

impl SubtreeSnapshot {
    pub fn leaf(id: NodeId, attrs: NodeAttrs) -> Self {
        Self {
            id,
            attrs,
            children: Vec::new(),
        }
    }

    /// Ids in pre-order, this node first.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    pub fn len(&self) -> usize {
        1 + self.children.iter().map(SubtreeSnapshot::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A subtree was placed at `parent[position]`. Plain inserts carry a leaf.
    Inserted {
        parent: NodeId,
        position: usize,
        snapshot: SubtreeSnapshot,
    },
    /// A subtree was removed from `parent[position]`.
    Deleted {
        parent: NodeId,
        position: usize,
        snapshot: SubtreeSnapshot,
        removed: Vec<NodeId>,
    },
    /// `to_position` indexes the new parent's children after the node was detached.
    Moved {
        id: NodeId,
        from_parent: NodeId,
        from_position: usize,
        to_parent: NodeId,
        to_position: usize,
    },
    AttributeSet {
        id: NodeId,
        before: AttrValue,
        after: AttrValue,
    },
}

impl Change {
    /// The node the change is about (the subtree root for inserts and deletes).
    pub fn node_id(&self) -> NodeId {
        match self {
            Change::Inserted { snapshot, .. } | Change::Deleted { snapshot, .. } => snapshot.id,
            Change::Moved { id, .. } | Change::AttributeSet { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Change::Inserted { .. } => "insert",
            Change::Deleted { .. } => "delete",
            Change::Moved { .. } => "move",
            Change::AttributeSet { .. } => "set",
        }
    }

    /// The change that undoes this one.
    pub fn inverse(&self) -> Change {
        match self.clone() {
            Change::Inserted {
                parent,
                position,
                snapshot,
            } => Change::Deleted {
                parent,
                position,
                removed: snapshot.ids(),
                snapshot,
            },
            Change::Deleted {
                parent,
                position,
                snapshot,
                ..
            } => Change::Inserted {
                parent,
                position,
                snapshot,
            },
            Change::Moved {
                id,
                from_parent,
                from_position,
                to_parent,
                to_position,
            } => Change::Moved {
                id,
                from_parent: to_parent,
                from_position: to_position,
                to_parent: from_parent,
                to_position: from_position,
            },
            Change::AttributeSet { id, before, after } => Change::AttributeSet {
                id,
                before: after,
                after: before,
            },
        }
    }

    /// Ids that no longer exist after this change.
    pub fn removed_ids(&self) -> &[NodeId] {
        match self {
            Change::Deleted { removed, .. } => removed,
            _ => &[],
        }
    }

    pub fn field(&self) -> Option<AttrField> {
        match self {
            Change::AttributeSet { after, .. } => Some(after.field()),
            _ => None,
        }
    }

    /// Whether the change can alter which rows a filter matches.
    pub fn affects_filter(&self) -> bool {
        self.field().map_or(true, |field| field.spec().filterable)
    }
}
