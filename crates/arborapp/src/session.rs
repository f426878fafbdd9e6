//! # Document Session
//!
//! A [`Session`] is one open outline: the [`OutlineStore`], its [`UndoLog`],
//! the [`ReferenceRegistry`] and the active filter. Nothing here is global;
//! two sessions never see each other's history or filter.
//!
//! ## Commands and Transactions
//!
//! Every mutating method runs as a transaction. [`Session::transaction`] is
//! the general form: the closure gets the store, may call any number of store
//! operations, and either
//!
//! - returns `Ok`: the emitted changes become one undo step and deleted rows
//!   are purged from the registry, or
//! - returns `Err`: every change it made is reverted before the error is
//!   handed back, and history is untouched.
//!
//! The single-operation methods (`insert`, `delete`, `move_node`, …) are
//! transactions of one step.
//!
//! ## Filtering
//!
//! The projection is computed lazily by [`Session::projection`] and reused
//! until the filter or a filter-relevant part of the store changes.

use std::sync::Arc;
use tracing::debug;

use crate::attributes::{AttrField, AttrValue};
use crate::error::Result;
use crate::filter::{FilterEngine, FilterSpec, Projection};
use crate::history::{rollback, Transaction, UndoLog, DEFAULT_UNDO_CAPACITY};
use crate::index::{index_rows, resolve_str, DisplayRow, IndexOptions};
use crate::filter::BackgroundMatcher;
use crate::model::{NodeAttrs, NodeId, PlanSlot, RowKind};
use crate::plan;
use crate::registry::{RefEntry, RefKind, ReferenceRegistry};
use crate::store::{Change, OutlineStore};
use crate::tasks::{self, TaskToggle};

#[derive(Debug)]
pub struct Session {
    store: OutlineStore,
    history: UndoLog,
    registry: ReferenceRegistry,
    filter: FilterEngine,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::from_parts(
            OutlineStore::new(),
            ReferenceRegistry::new(),
            DEFAULT_UNDO_CAPACITY,
        )
    }

    /// Wraps a loaded store and registry with an empty history.
    pub fn from_parts(
        store: OutlineStore,
        registry: ReferenceRegistry,
        undo_capacity: usize,
    ) -> Self {
        Self {
            store,
            history: UndoLog::new(undo_capacity),
            registry,
            filter: FilterEngine::new(),
        }
    }

    /// Uses a fixed "today" for date filters.
    pub fn with_filter_engine(mut self, filter: FilterEngine) -> Self {
        self.filter = filter;
        self
    }

    pub fn store(&self) -> &OutlineStore {
        &self.store
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    pub fn history(&self) -> &UndoLog {
        &self.history
    }

    pub fn root(&self) -> NodeId {
        self.store.root()
    }

    /// Resolves a row path, id or id prefix typed by a user.
    pub fn resolve(&self, input: &str) -> Result<NodeId> {
        resolve_str(&self.store, input)
    }

    /// An immutable copy of the store for off-thread readers.
    pub fn snapshot(&self) -> Arc<OutlineStore> {
        Arc::new(self.store.clone())
    }

    // --- Transactions ---

    /// Runs `f` as one undoable unit. All or nothing.
    pub fn transaction<T>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut OutlineStore) -> Result<T>,
    ) -> Result<T> {
        self.store.drain_changes();
        match f(&mut self.store) {
            Ok(value) => {
                let changes = self.store.drain_changes();
                self.purge_removed(&changes);
                debug!(label, changes = changes.len(), "transaction committed");
                self.history.record(Transaction::new(label, changes));
                Ok(value)
            }
            Err(e) => {
                rollback(&mut self.store);
                debug!(label, error = %e, "transaction rolled back");
                Err(e)
            }
        }
    }

    fn purge_removed(&mut self, changes: &[Change]) {
        for change in changes {
            self.registry.purge(change.removed_ids());
        }
    }

    pub fn insert(&mut self, parent: NodeId, position: usize, attrs: NodeAttrs) -> Result<NodeId> {
        self.transaction("insert", |store| store.insert(parent, position, attrs))
    }

    pub fn append(&mut self, parent: NodeId, attrs: NodeAttrs) -> Result<NodeId> {
        self.transaction("insert", |store| store.append(parent, attrs))
    }

    pub fn delete(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        self.transaction("delete", |store| store.delete(id))
    }

    /// Deletes several rows as one undo step. Rows already removed as part
    /// of an earlier row's subtree are skipped.
    pub fn delete_many(&mut self, ids: &[NodeId]) -> Result<Vec<NodeId>> {
        self.transaction("delete", |store| {
            let mut removed = Vec::new();
            for id in ids {
                if store.contains(*id) {
                    removed.extend(store.delete(*id)?);
                }
            }
            Ok(removed)
        })
    }

    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId, position: usize) -> Result<()> {
        self.transaction("move", |store| store.move_node(id, new_parent, position))
    }

    pub fn reorder(&mut self, id: NodeId, delta: isize) -> Result<bool> {
        self.transaction("reorder", |store| store.reorder(id, delta))
    }

    pub fn indent(&mut self, id: NodeId) -> Result<bool> {
        self.transaction("indent", |store| store.indent(id))
    }

    pub fn outdent(&mut self, id: NodeId) -> Result<bool> {
        self.transaction("outdent", |store| store.outdent(id))
    }

    pub fn set_attribute(&mut self, id: NodeId, value: AttrValue) -> Result<bool> {
        let label = format!("set {}", value.field());
        self.transaction(&label, |store| store.set_attribute(id, value))
    }

    /// Parses `raw` for `field` and sets it. A bare plan level (`3`) goes
    /// through [`Session::plan`] so the row lands at the end of the level.
    pub fn set_field(&mut self, id: NodeId, field: AttrField, raw: &str) -> Result<bool> {
        let value = AttrValue::parse(field, raw)?;
        if let AttrValue::Planned(Some(slot)) = value {
            if !raw.contains('.') {
                let before = self.store.get(id)?.planned;
                return Ok(self.plan(id, Some(slot.level))? != before);
            }
        }
        self.set_attribute(id, value)
    }

    pub fn toggle_task(&mut self, id: NodeId) -> Result<TaskToggle> {
        self.transaction("toggle task", |store| tasks::toggle_task(store, id))
    }

    pub fn toggle_project(&mut self, id: NodeId) -> Result<RowKind> {
        self.transaction("toggle project", |store| tasks::toggle_project(store, id))
    }

    // --- Planning ---

    /// Puts a row at the end of a plan level; `None` or `Some(0)` unplans it.
    pub fn plan(&mut self, id: NodeId, level: Option<u8>) -> Result<Option<PlanSlot>> {
        self.transaction("plan", |store| plan::set_plan_level(store, id, level))
    }

    pub fn move_in_plan(&mut self, id: NodeId, up: bool) -> Result<bool> {
        self.transaction("move in plan", |store| plan::move_in_plan(store, id, up))
    }

    /// Planned rows in plan order, narrowed to the filter's matches when a
    /// filter is active.
    pub fn plan_view(&mut self) -> Vec<(NodeId, PlanSlot)> {
        let rows = plan::planned_rows(&self.store);
        if !self.filter.spec().is_active() {
            return rows;
        }
        let projection = self.filter.projection(&self.store);
        rows.into_iter()
            .filter(|(id, _)| projection.is_matched(*id))
            .collect()
    }

    // --- History ---

    /// Reverts the last transaction. Returns false if there was none.
    pub fn undo(&mut self) -> Result<bool> {
        let applied = self.history.undo(&mut self.store)?;
        Ok(self.after_history(applied))
    }

    /// Replays the last undone transaction. Returns false if there was none.
    pub fn redo(&mut self) -> Result<bool> {
        let applied = self.history.redo(&mut self.store)?;
        Ok(self.after_history(applied))
    }

    fn after_history(&mut self, applied: Option<Vec<Change>>) -> bool {
        match applied {
            Some(changes) => {
                self.purge_removed(&changes);
                true
            }
            None => false,
        }
    }

    // --- References ---

    pub fn references(&self, kind: RefKind) -> &[RefEntry] {
        self.registry.entries(kind)
    }

    pub fn add_reference(
        &mut self,
        kind: RefKind,
        label: impl Into<String>,
        target: NodeId,
    ) -> Result<usize> {
        self.registry.add(kind, label, target, &self.store)
    }

    pub fn rename_reference(
        &mut self,
        kind: RefKind,
        position: usize,
        label: impl Into<String>,
    ) -> Result<()> {
        self.registry.rename(kind, position, label, &self.store)
    }

    pub fn remove_reference(&mut self, kind: RefKind, position: usize) -> Result<RefEntry> {
        self.registry.remove(kind, position)
    }

    pub fn reorder_reference(&mut self, kind: RefKind, from: usize, to: usize) -> Result<()> {
        self.registry.reorder(kind, from, to)
    }

    pub fn resolve_reference(&self, kind: RefKind, position: usize) -> Result<NodeId> {
        self.registry.resolve(kind, position, &self.store)
    }

    // --- Filtering ---

    pub fn filter(&self) -> &FilterSpec {
        self.filter.spec()
    }

    /// Replaces the active filter, returning its generation.
    pub fn set_filter(&mut self, spec: FilterSpec) -> u64 {
        self.filter.set_spec(spec)
    }

    /// Sets the filter from search-bar syntax.
    pub fn set_query(&mut self, query: &str) -> u64 {
        let spec = FilterSpec::parse_query(query, self.filter.today());
        self.filter.set_spec(spec)
    }

    pub fn clear_filter(&mut self) -> u64 {
        self.filter.clear()
    }

    pub fn projection(&mut self) -> &Projection {
        self.filter.projection(&self.store)
    }

    /// Hands the active filter and a snapshot of the store to `matcher`,
    /// returning the generation to wait for. A later submission supersedes
    /// this one.
    pub fn submit_background(&self, matcher: &BackgroundMatcher) -> u64 {
        matcher.submit(self.filter.spec().clone(), self.filter.today(), self.snapshot())
    }

    /// Rows under `top` as a view shows them: filtered when a filter is
    /// active, with collapsed rows folded unless `options` says otherwise.
    pub fn visible_rows(&mut self, top: NodeId, options: IndexOptions) -> Result<Vec<DisplayRow>> {
        if !self.filter.spec().is_active() {
            return index_rows(&self.store, top, None, options);
        }
        let projection = self.filter.projection(&self.store);
        index_rows(&self.store, top, Some(projection), options)
    }
}
