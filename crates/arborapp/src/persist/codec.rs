use serde_json::Value;
use tracing::warn;

use super::document::{Document, CURRENT_VERSION};
use super::migrate::migrate;
use crate::error::{ArborError, Result};
use crate::registry::{RefKind, ReferenceRegistry};
use crate::store::{OutlineStore, SubtreeSnapshot};

/// Captures the store and registry as a document. Pure: the same state
/// always yields an equal document.
pub fn export(store: &OutlineStore, registry: &ReferenceRegistry) -> Result<Document> {
    Ok(Document {
        version: CURRENT_VERSION,
        root: store.snapshot(store.root())?.into(),
        bookmarks: registry.entries(RefKind::Bookmark).to_vec(),
        quick_links: registry.entries(RefKind::QuickLink).to_vec(),
    })
}

/// Rebuilds a store and registry, keeping every id.
///
/// Structural problems (duplicate ids, out-of-range values, wrong version)
/// are [`ArborError::MalformedDocument`]. References to unknown rows are
/// dropped with a warning rather than failing the whole document.
pub fn import(document: Document) -> Result<(OutlineStore, ReferenceRegistry)> {
    if document.version != CURRENT_VERSION {
        return Err(ArborError::MalformedDocument(format!(
            "expected version {CURRENT_VERSION}, found {}",
            document.version
        )));
    }
    let store = OutlineStore::from_snapshot(SubtreeSnapshot::from(document.root)).map_err(
        |e| match e {
            ArborError::DuplicateNode(id) => {
                ArborError::MalformedDocument(format!("row id {id} appears more than once"))
            }
            ArborError::InvalidValue { .. } => ArborError::MalformedDocument(e.to_string()),
            other => other,
        },
    )?;
    let (registry, dropped) =
        ReferenceRegistry::from_entries(document.bookmarks, document.quick_links, &store);
    for entry in dropped {
        warn!(label = %entry.label, target = %entry.target_id, "dropping reference to missing row");
    }
    Ok((store, registry))
}

/// Pretty-printed JSON with a trailing newline. Field order is fixed by the
/// document types, so output is byte-stable.
pub fn to_json(document: &Document) -> Result<String> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');
    Ok(json)
}

/// Parses any supported schema version, migrating older ones.
pub fn from_json(text: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ArborError::MalformedDocument(format!("not valid JSON: {e}")))?;
    let value = migrate(value)?;
    serde_json::from_value(value).map_err(|e| ArborError::MalformedDocument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Link, NodeAttrs, NodeId, RepeatRule, RepeatUnit, RowKind};
    use chrono::NaiveDate;

    fn populated() -> (OutlineStore, ReferenceRegistry) {
        let mut store = OutlineStore::new();
        let root = store.root();
        let project = store
            .append(
                root,
                NodeAttrs::new("garden").with_kind(RowKind::SequentialProject),
            )
            .unwrap();
        let task = store
            .append(
                project,
                NodeAttrs::new("water :plants")
                    .with_kind(RowKind::Todo)
                    .with_color(Color::Green)
                    .with_estimate(15)
                    .with_start_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
                    .with_repeat(RepeatRule::new(1, RepeatUnit::Week))
                    .with_tag("home"),
            )
            .unwrap();
        store
            .append(root, NodeAttrs::new("see").with_link(Link::Internal(task)))
            .unwrap();
        let mut registry = ReferenceRegistry::new();
        registry
            .add(RefKind::Bookmark, "water", task, &store)
            .unwrap();
        registry
            .add(RefKind::QuickLink, "garden", project, &store)
            .unwrap();
        (store, registry)
    }

    #[test]
    fn import_of_export_is_equal() {
        let (store, registry) = populated();
        let json = to_json(&export(&store, &registry).unwrap()).unwrap();
        let (back, back_registry) = import(from_json(&json).unwrap()).unwrap();
        assert_eq!(back, store);
        assert_eq!(back_registry, registry);
    }

    #[test]
    fn export_is_deterministic() {
        let (store, registry) = populated();
        let first = to_json(&export(&store, &registry).unwrap()).unwrap();
        let second = to_json(&export(&store.clone(), &registry).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"type\": \"sequential-project\""));
        assert!(first.contains("\"repeat\": \"1w\""));
    }

    #[test]
    fn duplicate_ids_are_malformed() {
        let (store, registry) = populated();
        let mut document = export(&store, &registry).unwrap();
        let copy = document.root.children[0].clone();
        document.root.children.push(copy);
        assert!(import(document).unwrap_err().is_malformed());
    }

    #[test]
    fn out_of_range_values_are_malformed() {
        let (store, registry) = populated();
        let mut document = export(&store, &registry).unwrap();
        document.root.children[0].estimate_minutes = Some(u32::MAX);
        assert!(import(document).unwrap_err().is_malformed());

        let json = to_json(&export(&store, &registry).unwrap())
            .unwrap()
            .replace("\"estimate_minutes\": 15", "\"estimate_minutes\": -15");
        assert!(from_json(&json).unwrap_err().is_malformed());
    }

    #[test]
    fn missing_fields_and_bad_json_are_malformed() {
        assert!(from_json("{ not json").unwrap_err().is_malformed());
        let missing_text = format!(
            r#"{{"version": 3, "root": {{"id": "{}", "type": "note"}}}}"#,
            NodeId::new()
        );
        assert!(from_json(&missing_text).unwrap_err().is_malformed());
    }

    #[test]
    fn dangling_references_are_dropped() {
        let (store, registry) = populated();
        let mut document = export(&store, &registry).unwrap();
        document.bookmarks.push(crate::registry::RefEntry {
            label: "ghost".into(),
            target_id: NodeId::new(),
        });
        let (_, registry) = import(document).unwrap();
        assert_eq!(registry.entries(RefKind::Bookmark).len(), 1);
    }
}
