//! # Row Addressing: Ids vs Paths
//!
//! Rows are identified by UUIDs, which are the right technical choice and
//! cumbersome to type. Text interfaces therefore also accept:
//!
//! 1. **Paths**: 1-based positions from the root, dot separated. `2.1` is the
//!    first child of the second top-level row.
//! 2. **Id prefixes**: the leading characters of a UUID, as long as exactly
//!    one row starts with them (at least four characters).
//!
//! Paths are positional, so they change when rows move. Anything that has to
//! survive edits (bookmarks, links, the document) stores the UUID.
//!
//! [`index_rows`] walks the tree in document order and pairs each row with its
//! path and depth, honouring a filter projection and collapsed rows. Views
//! should use it rather than enumerating children themselves.

use std::fmt;
use std::str::FromStr;

use crate::error::{ArborError, Result};
use crate::filter::Projection;
use crate::model::NodeId;
use crate::store::OutlineStore;

const MIN_PREFIX: usize = 4;

/// A user's way of naming a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSelector {
    Path(Vec<usize>),
    Id(NodeId),
    Prefix(String),
}

impl fmt::Display for RowSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowSelector::Path(path) => f.write_str(&format_path(path)),
            RowSelector::Id(id) => id.fmt(f),
            RowSelector::Prefix(prefix) => write!(f, "{prefix}…"),
        }
    }
}

impl FromStr for RowSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(path) = parse_path(s) {
            return Ok(RowSelector::Path(path));
        }
        if let Ok(id) = s.parse::<NodeId>() {
            return Ok(RowSelector::Id(id));
        }
        let is_hex = s.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
        if is_hex && s.len() >= MIN_PREFIX {
            return Ok(RowSelector::Prefix(s.to_ascii_lowercase()));
        }
        Err(format!(
            "'{s}' is neither a row path (e.g. 2.1) nor a row id (at least {MIN_PREFIX} hex digits)"
        ))
    }
}

fn parse_path(s: &str) -> Option<Vec<usize>> {
    s.split('.')
        .map(|part| part.parse::<usize>().ok().filter(|n| *n >= 1))
        .collect()
}

pub fn format_path(path: &[usize]) -> String {
    path.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// 1-based path of a row. Empty for the root.
pub fn path_of(store: &OutlineStore, id: NodeId) -> Result<Vec<usize>> {
    let mut path = vec![store.position_of(id)? + 1];
    for ancestor in store.ancestors_of(id)? {
        if store.parent_of(ancestor)?.is_some() {
            path.push(store.position_of(ancestor)? + 1);
        }
    }
    if id == store.root() {
        path.clear();
    }
    path.reverse();
    Ok(path)
}

pub fn resolve(store: &OutlineStore, selector: &RowSelector) -> Result<NodeId> {
    match selector {
        RowSelector::Id(id) if store.contains(*id) => Ok(*id),
        RowSelector::Id(id) => Err(ArborError::NodeNotFound(*id)),
        RowSelector::Path(path) => {
            let mut current = store.root();
            for position in path {
                current = store
                    .children_of(current)?
                    .get(position - 1)
                    .copied()
                    .ok_or_else(|| {
                        ArborError::ReferenceNotFound(format!("row {}", format_path(path)))
                    })?;
            }
            Ok(current)
        }
        RowSelector::Prefix(prefix) => {
            let mut found = store
                .preorder()
                .filter(|id| id.to_string().starts_with(prefix.as_str()));
            match (found.next(), found.next()) {
                (Some(id), None) => Ok(id),
                (None, _) => Err(ArborError::ReferenceNotFound(format!(
                    "no row id starts with '{prefix}'"
                ))),
                (Some(_), Some(_)) => Err(ArborError::ReferenceNotFound(format!(
                    "'{prefix}' matches several rows"
                ))),
            }
        }
    }
}

/// Parses and resolves in one go.
pub fn resolve_str(store: &OutlineStore, input: &str) -> Result<NodeId> {
    let selector = input
        .parse::<RowSelector>()
        .map_err(ArborError::ReferenceNotFound)?;
    resolve(store, &selector)
}

/// A row ready to be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub id: NodeId,
    pub path: Vec<usize>,
    /// 0 for top-level rows.
    pub depth: usize,
    /// False for rows shown only because a descendant matched.
    pub matched: bool,
    /// Has children that are not listed because the row is collapsed.
    pub folded: bool,
}

/// Options for [`index_rows`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    /// List children of collapsed rows too.
    pub expand_all: bool,
}

/// Rows below `top` in document order, restricted to `projection` if given.
///
/// Paths are always positions in the full tree, so `2.3` names the same row
/// whether or not a filter hides rows 2.1 and 2.2.
pub fn index_rows(
    store: &OutlineStore,
    top: NodeId,
    projection: Option<&Projection>,
    options: IndexOptions,
) -> Result<Vec<DisplayRow>> {
    let mut rows = Vec::new();
    let base = path_of(store, top)?;
    index_level(store, top, &base, 0, projection, options, &mut rows)?;
    Ok(rows)
}

fn index_level(
    store: &OutlineStore,
    parent: NodeId,
    parent_path: &[usize],
    depth: usize,
    projection: Option<&Projection>,
    options: IndexOptions,
    rows: &mut Vec<DisplayRow>,
) -> Result<()> {
    for (index, child) in store.children_of(parent)?.iter().copied().enumerate() {
        if projection.is_some_and(|p| !p.is_visible(child)) {
            continue;
        }
        let mut path = parent_path.to_vec();
        path.push(index + 1);
        let attrs = store.get(child)?;
        let has_children = !store.children_of(child)?.is_empty();
        // a filter opens collapsed rows so matches stay reachable
        let open = options.expand_all || projection.is_some() || !attrs.collapsed;
        rows.push(DisplayRow {
            id: child,
            path: path.clone(),
            depth,
            matched: projection.map_or(true, |p| p.is_matched(child)),
            folded: has_children && !open,
        });
        if open {
            index_level(store, child, &path, depth + 1, projection, options, rows)?;
        }
    }
    Ok(())
}
