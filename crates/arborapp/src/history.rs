//! # Undo / Redo
//!
//! A [`Transaction`] is the list of [`Change`]s one user command produced, in
//! the order they happened. Undoing it applies each change's inverse in
//! reverse order; redoing replays the original list. Since deletions record
//! the removed subtree verbatim, undo brings back the very same ids.
//!
//! The log is bounded: past [`UndoLog::capacity`] the oldest transaction is
//! dropped without notice. Recording a new transaction clears the redo stack.

use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::error::Result;
use crate::store::{Change, OutlineStore};

pub const DEFAULT_UNDO_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub label: String,
    pub changes: Vec<Change>,
}

impl Transaction {
    pub fn new(label: impl Into<String>, changes: Vec<Change>) -> Self {
        Self {
            label: label.into(),
            changes,
        }
    }

    /// The changes that undo this transaction, in the order to apply them.
    pub fn inverse_changes(&self) -> Vec<Change> {
        self.changes.iter().rev().map(Change::inverse).collect()
    }
}

#[derive(Debug)]
pub struct UndoLog {
    undo: VecDeque<Transaction>,
    redo: Vec<Transaction>,
    capacity: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

impl UndoLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Label of the transaction `undo` would revert.
    pub fn next_undo(&self) -> Option<&str> {
        self.undo.back().map(|t| t.label.as_str())
    }

    pub fn next_redo(&self) -> Option<&str> {
        self.redo.last().map(|t| t.label.as_str())
    }

    /// Records a finished transaction. Empty transactions are ignored.
    pub fn record(&mut self, transaction: Transaction) {
        if transaction.changes.is_empty() {
            return;
        }
        self.redo.clear();
        self.push_undo(transaction);
    }

    fn push_undo(&mut self, transaction: Transaction) {
        if self.capacity == 0 {
            return;
        }
        self.undo.push_back(transaction);
        while self.undo.len() > self.capacity {
            if let Some(dropped) = self.undo.pop_front() {
                debug!(label = %dropped.label, "undo history truncated");
            }
        }
    }

    /// Reverts the most recent transaction.
    ///
    /// Returns the changes that were applied, or `None` if there was nothing
    /// to undo.
    pub fn undo(&mut self, store: &mut OutlineStore) -> Result<Option<Vec<Change>>> {
        let Some(transaction) = self.undo.pop_back() else {
            return Ok(None);
        };
        match apply_all(store, &transaction.inverse_changes()) {
            Ok(applied) => {
                debug!(label = %transaction.label, "undo");
                self.redo.push(transaction);
                Ok(Some(applied))
            }
            Err(e) => {
                self.undo.push_back(transaction);
                Err(e)
            }
        }
    }

    /// Replays the most recently undone transaction.
    pub fn redo(&mut self, store: &mut OutlineStore) -> Result<Option<Vec<Change>>> {
        let Some(transaction) = self.redo.pop() else {
            return Ok(None);
        };
        match apply_all(store, &transaction.changes) {
            Ok(applied) => {
                debug!(label = %transaction.label, "redo");
                self.push_undo(transaction);
                Ok(Some(applied))
            }
            Err(e) => {
                self.redo.push(transaction);
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Applies `changes` in order, all or nothing.
///
/// On failure the already-applied prefix is reverted before the error is
/// returned. Returns the changes the store emitted.
pub(crate) fn apply_all(store: &mut OutlineStore, changes: &[Change]) -> Result<Vec<Change>> {
    store.drain_changes();
    for change in changes {
        if let Err(e) = store.apply(change) {
            rollback(store);
            return Err(e);
        }
    }
    Ok(store.drain_changes())
}

/// Reverts every change still in the store's journal.
pub(crate) fn rollback(store: &mut OutlineStore) {
    let applied = store.drain_changes();
    for change in applied.iter().rev() {
        if let Err(e) = store.apply(&change.inverse()) {
            warn!(error = %e, change = change.kind(), "rollback step failed");
        }
    }
    store.drain_changes();
}
