use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Color, Link, NodeAttrs, NodeId, PlanSlot, RepeatRule, RowKind};
use crate::registry::RefEntry;
use crate::store::SubtreeSnapshot;

/// Schema version written by this crate.
pub const CURRENT_VERSION: u64 = 3;

/// The canonical on-disk document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub version: u64,
    pub root: NodeObject,
    #[serde(default)]
    pub bookmarks: Vec<RefEntry>,
    #[serde(default)]
    pub quick_links: Vec<RefEntry>,
}

/// One row with all its attributes. `children` order is the row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeObject {
    pub id: NodeId,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: RowKind,
    pub color: Color,
    pub estimate_minutes: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub repeat: Option<RepeatRule>,
    pub link: Option<Link>,
    pub collapsed: bool,
    /// Absent for unplanned rows, so documents without planning stay valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned: Option<PlanSlot>,
    pub children: Vec<NodeObject>,
}

impl From<SubtreeSnapshot> for NodeObject {
    fn from(snapshot: SubtreeSnapshot) -> Self {
        let SubtreeSnapshot {
            id,
            attrs,
            children,
        } = snapshot;
        NodeObject {
            id,
            text: attrs.text,
            kind: attrs.kind,
            color: attrs.color,
            estimate_minutes: attrs.estimate,
            start_date: attrs.start_date,
            // BTreeSet iteration keeps this sorted, so output is stable
            tags: attrs.tags.into_iter().collect(),
            repeat: attrs.repeat,
            link: attrs.link,
            collapsed: attrs.collapsed,
            planned: attrs.planned,
            children: children.into_iter().map(NodeObject::from).collect(),
        }
    }
}

impl From<NodeObject> for SubtreeSnapshot {
    fn from(node: NodeObject) -> Self {
        let attrs = NodeAttrs {
            text: node.text,
            kind: node.kind,
            color: node.color,
            estimate: node.estimate_minutes,
            start_date: node.start_date,
            tags: node.tags.into_iter().collect(),
            repeat: node.repeat,
            link: node.link,
            collapsed: node.collapsed,
            planned: node.planned,
        };
        SubtreeSnapshot {
            id: node.id,
            attrs,
            children: node
                .children
                .into_iter()
                .map(SubtreeSnapshot::from)
                .collect(),
        }
    }
}
