use std::collections::HashSet;

use crate::model::NodeId;
use crate::store::OutlineStore;

/// Rows to show under a filter: the matches plus every ancestor needed to
/// reach them. Derived data, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    matched: HashSet<NodeId>,
    visible: HashSet<NodeId>,
}

impl Projection {
    /// Closes `matched` over ancestors. The root is left out of both sets.
    pub fn from_matches(store: &OutlineStore, matched: HashSet<NodeId>) -> Self {
        let root = store.root();
        let mut visible = HashSet::with_capacity(matched.len());
        for id in &matched {
            let mut current = Some(*id);
            while let Some(node) = current {
                if node == root || !visible.insert(node) {
                    break;
                }
                current = store.parent_of(node).ok().flatten();
            }
        }
        let mut matched = matched;
        matched.remove(&root);
        Self { matched, visible }
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.visible.contains(&id)
    }

    pub fn is_matched(&self, id: NodeId) -> bool {
        self.matched.contains(&id)
    }

    pub fn matched(&self) -> &HashSet<NodeId> {
        &self.matched
    }

    pub fn visible(&self) -> &HashSet<NodeId> {
        &self.visible
    }

    /// Visible only because a descendant matched.
    pub fn forced_ancestors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.visible.difference(&self.matched).copied()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeAttrs;

    #[test]
    fn ancestors_are_pulled_in_but_not_descendants() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let a = store.append(root, NodeAttrs::new("a")).unwrap();
        let a1 = store.append(a, NodeAttrs::new("a1")).unwrap();
        let a1x = store.append(a1, NodeAttrs::new("a1x")).unwrap();
        let a1x_child = store.append(a1x, NodeAttrs::new("below")).unwrap();
        let b = store.append(root, NodeAttrs::new("b")).unwrap();

        let projection = Projection::from_matches(&store, HashSet::from([a1x]));
        assert_eq!(projection.visible(), &HashSet::from([a, a1, a1x]));
        assert!(!projection.is_visible(a1x_child));
        assert!(!projection.is_visible(b));
        assert!(!projection.is_visible(root));
        let forced: HashSet<_> = projection.forced_ancestors().collect();
        assert_eq!(forced, HashSet::from([a, a1]));
    }
}
