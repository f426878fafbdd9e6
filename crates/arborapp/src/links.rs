//! Links: the `link` attribute and inline links written in row text.
//!
//! An inline link is a row id wrapped in `#`, e.g. `see #6f1c…#`. Unlike
//! bookmarks these are free text: nothing keeps them in sync with deletions,
//! and resolving a stale one fails with [`ArborError::NodeNotFound`].

use crate::error::{ArborError, Result};
use crate::model::{Link, NodeId};
use crate::store::OutlineStore;

const INLINE_MARK: char = '#';

/// Where a row's link leads once checked against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Node(NodeId),
    External(String),
}

/// Ids referenced inline in `text`, in order of appearance.
pub fn inline_links(text: &str) -> Vec<NodeId> {
    text.split(INLINE_MARK)
        .skip(1)
        .step_by(2)
        .filter_map(|candidate| candidate.parse().ok())
        .collect()
}

/// Writes an inline link to `id`.
pub fn format_inline_link(id: NodeId) -> String {
    format!("{INLINE_MARK}{id}{INLINE_MARK}")
}

pub fn resolve_inline(store: &OutlineStore, id: NodeId) -> Result<NodeId> {
    if store.contains(id) {
        Ok(id)
    } else {
        Err(ArborError::NodeNotFound(id))
    }
}

/// Follows the `link` attribute of `id`.
///
/// Returns `Ok(None)` if the row has no link. Internal links are checked
/// against the store; external ones are returned as written.
pub fn resolve_link(store: &OutlineStore, id: NodeId) -> Result<Option<LinkTarget>> {
    match &store.get(id)?.link {
        None => Ok(None),
        Some(Link::Internal(target)) => resolve_inline(store, *target).map(|t| Some(LinkTarget::Node(t))),
        Some(Link::External(target)) => Ok(Some(LinkTarget::External(target.clone()))),
    }
}

/// `http(s)://` addresses written in row text.
pub fn urls_in(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|word| word.starts_with("http://") || word.starts_with("https://"))
        .collect()
}
