//! Schema upgrades over raw JSON values.
//!
//! Each step lifts a document exactly one version. [`migrate`] chains them
//! until the document is at [`CURRENT_VERSION`].
//!
//! | Version | Shape |
//! |---------|-------|
//! | 1 | TreeNote export: a bare `[rootItem, bookmarkRoot]` array of items keyed by `creation_date_time`, with `childItems`, `date` as `dd.MM.yy`, `estimate` as a string, `expanded`, hex colours, `planned`/`planned_order`, and `repeat=` written in the text |
//! | 2 | versioned object: `children`, UUID ids, ISO `start_date`, integer `estimate_minutes`, `collapsed`, `tags`, `bookmarks`, `quick_links` |
//! | 3 | adds `repeat` and `link` fields |

use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::document::CURRENT_VERSION;
use crate::error::{ArborError, Result};
use crate::model::{Color, RepeatRule, RowKind, MAX_PLAN_LEVEL};

/// Start date meaning "no date" in version 1 documents.
const LEGACY_EMPTY_DATE: &str = "14.09.52";
const LEGACY_NO_COLOR: &str = "NO_COLOR";
const REPEAT_PREFIX: &str = "repeat=";

fn malformed(reason: impl Into<String>) -> ArborError {
    ArborError::MalformedDocument(reason.into())
}

/// Version declared by a document. A bare array is a version 1 export;
/// objects must say which version they are.
pub fn document_version(value: &Value) -> Result<u64> {
    match value {
        Value::Array(_) => Ok(1),
        Value::Object(doc) => match doc.get("version") {
            None => Err(malformed("missing version")),
            Some(v) => v
                .as_u64()
                .filter(|v| *v >= 2)
                .ok_or_else(|| malformed(format!("invalid version {v}"))),
        },
        _ => Err(malformed("document is neither a JSON object nor an array")),
    }
}

/// Upgrades `value` to the current schema.
pub fn migrate(mut value: Value) -> Result<Value> {
    let from = document_version(&value)?;
    if from > CURRENT_VERSION {
        return Err(malformed(format!(
            "version {from} is newer than supported version {CURRENT_VERSION}"
        )));
    }
    for version in from..CURRENT_VERSION {
        value = match version {
            1 => v1_to_v2(value)?,
            _ => v2_to_v3(value)?,
        };
        info!(from = version, to = version + 1, "migrated document");
    }
    Ok(value)
}

fn object_mut<'a>(value: &'a mut Value, what: &str) -> Result<&'a mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| malformed(format!("{what} is not an object")))
}

/// Version 1 rows have no ids. Each gets a fresh UUID, remembered under its
/// `creation_date_time` so bookmarks can follow.
type LegacyIds = HashMap<String, String>;

fn v1_to_v2(value: Value) -> Result<Value> {
    let Value::Array(parts) = value else {
        return Err(malformed("version 1 document is not an array"));
    };
    let [root, bookmark_root]: [Value; 2] = parts
        .try_into()
        .map_err(|parts: Vec<Value>| {
            malformed(format!("expected [items, bookmarks], found {} parts", parts.len()))
        })?;

    let mut ids = LegacyIds::new();
    let root = v1_node(root, &mut ids)?;
    let bookmarks = v1_bookmarks(bookmark_root, &ids)?;

    let mut out = Map::new();
    out.insert("version".into(), 2.into());
    out.insert("root".into(), root);
    out.insert("bookmarks".into(), Value::Array(bookmarks));
    out.insert("quick_links".into(), Value::Array(Vec::new()));
    Ok(Value::Object(out))
}

/// `creation_date_time` as a lookup key. TreeNote wrote it as a float, so
/// the same row always prints to the same key.
fn creation_key(node: &Map<String, Value>, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn v1_node(mut value: Value, ids: &mut LegacyIds) -> Result<Value> {
    let node = object_mut(&mut value, "row")?;
    let new_id = Uuid::new_v4().to_string();
    let old_key = creation_key(node, "creation_date_time")
        .ok_or_else(|| malformed("row without creation_date_time"))?;
    if ids.insert(old_key.clone(), new_id.clone()).is_some() {
        return Err(malformed(format!("duplicate creation_date_time {old_key}")));
    }

    let text = str_field(node, "text")?.unwrap_or_default();
    let kind = match str_field(node, "type")? {
        Some(raw) => raw.parse::<RowKind>().map_err(|e| malformed(e.to_string()))?,
        None => RowKind::Note,
    };
    let color = str_field(node, "color")?
        .map(|raw| legacy_color(&raw))
        .unwrap_or_default();
    let start_date = match str_field(node, "date")?.as_deref() {
        None | Some("") | Some(LEGACY_EMPTY_DATE) => Value::Null,
        Some(raw) => chrono::NaiveDate::parse_from_str(raw, "%d.%m.%y")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| malformed(format!("bad date '{raw}'")))?,
    };
    let estimate = match node.get("estimate") {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(s)) if s.trim().is_empty() => Value::Null,
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Value::from)
            .map_err(|_| malformed(format!("bad estimate '{s}'")))?,
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Value::from)
            .ok_or_else(|| malformed(format!("bad estimate {n}")))?,
        Some(other) => return Err(malformed(format!("bad estimate {other}"))),
    };
    let expanded = node
        .get("expanded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let planned = v1_plan(node, &text);
    let children = match node.remove("childItems") {
        Some(Value::Array(children)) => children
            .into_iter()
            .map(|child| v1_node(child, ids))
            .collect::<Result<Vec<_>>>()?,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => return Err(malformed("childItems is not a list")),
    };

    let mut out = Map::new();
    out.insert("id".into(), new_id.into());
    out.insert("text".into(), text.into());
    out.insert("type".into(), kind.as_str().into());
    out.insert("color".into(), color.as_str().into());
    out.insert("estimate_minutes".into(), estimate);
    out.insert("start_date".into(), start_date);
    out.insert("tags".into(), Value::Array(Vec::new()));
    out.insert("collapsed".into(), (!expanded).into());
    if let Some(planned) = planned {
        out.insert("planned".into(), planned);
    }
    out.insert("children".into(), Value::Array(children));
    Ok(Value::Object(out))
}

/// `planned` 0 means unplanned. Levels outside the known range are dropped.
fn v1_plan(node: &Map<String, Value>, text: &str) -> Option<Value> {
    let level = node.get("planned").and_then(Value::as_u64).unwrap_or(0);
    if level == 0 {
        return None;
    }
    if level > u64::from(MAX_PLAN_LEVEL) {
        warn!(text, level, "dropping unknown plan level");
        return None;
    }
    let order = node
        .get("planned_order")
        .and_then(Value::as_u64)
        .and_then(|order| u32::try_from(order).ok())
        .unwrap_or(0);
    let mut out = Map::new();
    out.insert("level".into(), level.into());
    out.insert("order".into(), order.into());
    Some(Value::Object(out))
}

/// Bookmarks are the children of the second root. Each points at the row
/// whose `creation_date_time` it saved; the saved search text has no
/// counterpart and is dropped.
fn v1_bookmarks(mut bookmark_root: Value, ids: &LegacyIds) -> Result<Vec<Value>> {
    let root = object_mut(&mut bookmark_root, "bookmark root")?;
    let entries = match root.remove("childItems") {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(_) => return Err(malformed("bookmarks are not a list")),
    };
    Ok(entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let label = entry.get("text").and_then(Value::as_str).unwrap_or_default();
            let Some(saved) = creation_key(entry, "saved_root_item_creation_date_time") else {
                warn!(label, "dropping bookmark without a saved row");
                return None;
            };
            let Some(target) = ids.get(&saved) else {
                warn!(label, saved = %saved, "dropping bookmark to unknown row");
                return None;
            };
            if let Some(search) = entry.get("search_text").and_then(Value::as_str) {
                if !search.is_empty() {
                    debug!(label, search, "bookmark search text not carried over");
                }
            }
            let mut out = Map::new();
            out.insert("label".into(), label.into());
            out.insert("target_id".into(), target.clone().into());
            Some(Value::Object(out))
        })
        .collect())
}

fn str_field(node: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match node.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(malformed(format!("{key} is not a string: {other}"))),
    }
}

fn legacy_color(raw: &str) -> Color {
    if raw == LEGACY_NO_COLOR {
        return Color::NoColor;
    }
    Color::from_hex(raw).unwrap_or_else(|| {
        warn!(color = raw, "unknown colour, using none");
        Color::NoColor
    })
}

fn v2_to_v3(mut value: Value) -> Result<Value> {
    let doc = object_mut(&mut value, "document")?;
    let root = doc.get_mut("root").ok_or_else(|| malformed("missing root"))?;
    v2_node(root)?;
    doc.insert("version".into(), 3.into());
    Ok(value)
}

/// Moves a `repeat=<rule>` word out of the text into its own field.
fn v2_node(value: &mut Value) -> Result<()> {
    let node = object_mut(value, "row")?;
    let text = str_field(node, "text")?.unwrap_or_default();
    let mut repeat = None;
    let kept: Vec<&str> = text
        .split(' ')
        .filter(|word| {
            let rule = word
                .strip_prefix(REPEAT_PREFIX)
                .and_then(|raw| raw.parse::<RepeatRule>().ok());
            match rule {
                Some(rule) if repeat.is_none() => {
                    repeat = Some(rule);
                    false
                }
                _ => true,
            }
        })
        .collect();
    if let Some(rule) = repeat {
        node.insert("text".into(), kept.join(" ").trim_end().into());
        node.insert("repeat".into(), rule.to_string().into());
    } else {
        node.entry("repeat").or_insert(Value::Null);
    }
    node.entry("link").or_insert(Value::Null);
    if let Some(Value::Array(children)) = node.get_mut("children") {
        for child in children {
            v2_node(child)?;
        }
    }
    Ok(())
}
