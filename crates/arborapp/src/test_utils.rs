use std::collections::HashMap;

use crate::model::{NodeAttrs, NodeId, RowKind};
use crate::store::OutlineStore;

/// Builds an outline from indented lines, two spaces per level.
///
/// Returns the store and each row's id keyed by its text.
pub fn outline(lines: &[&str]) -> (OutlineStore, HashMap<String, NodeId>) {
    let mut store = OutlineStore::new();
    let mut ids = HashMap::new();
    let mut parents = vec![store.root()];
    for line in lines {
        let text = line.trim_start();
        let depth = (line.len() - text.len()) / 2;
        parents.truncate(depth + 1);
        let parent = parents[parents.len() - 1];
        let id = store
            .append(parent, NodeAttrs::new(text))
            .expect("parent exists");
        ids.insert(text.to_string(), id);
        parents.push(id);
    }
    store.drain_changes();
    (store, ids)
}

/// root → {A (todo, tag work), B (note, tag home)}, A → {C (done)}.
pub struct Scenario {
    pub store: OutlineStore,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
}

pub fn work_home_scenario() -> Scenario {
    let mut store = OutlineStore::new();
    let root = store.root();
    let a = store
        .append(
            root,
            NodeAttrs::new("A").with_kind(RowKind::Todo).with_tag("work"),
        )
        .expect("root exists");
    let b = store
        .append(root, NodeAttrs::new("B").with_tag("home"))
        .expect("root exists");
    let c = store
        .append(a, NodeAttrs::new("C").with_kind(RowKind::Done))
        .expect("A exists");
    store.drain_changes();
    Scenario { store, a, b, c }
}
