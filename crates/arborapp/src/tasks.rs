//! # Tasks and Projects
//!
//! Rows double as a lightweight task manager. The row type drives it:
//!
//! - `todo` / `done`: a task and its completed state
//! - `sequential-project`: children are worked top to bottom, so only the
//!   first child that still has open work is available
//! - `parallel-project`: every child is available
//! - `paused-project`: no child is available
//!
//! ## Toggles
//!
//! [`toggle_task`] cycles note → todo → done → note. A todo with a repeat rule
//! and a start date is not completed: its start date moves forward by the rule
//! and it stays open.
//!
//! [`toggle_project`] cycles any non-project → sequential → parallel → paused
//! → note.
//!
//! Both are plain attribute sets on the store, so they are undoable like any
//! other edit.

use chrono::NaiveDate;

use crate::attributes::{AttrField, AttrValue};
use crate::error::{ArborError, Result};
use crate::model::{NodeId, RowKind};
use crate::store::OutlineStore;

/// What [`toggle_task`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskToggle {
    Kind(RowKind),
    /// A repeating todo moved to its next date.
    Rescheduled(NaiveDate),
}

pub fn toggle_task(store: &mut OutlineStore, id: NodeId) -> Result<TaskToggle> {
    let attrs = store.get(id)?;
    let next = match attrs.kind {
        RowKind::Todo => match (attrs.repeat, attrs.start_date) {
            (Some(rule), Some(date)) => {
                let next_date = rule.advance(date).ok_or_else(|| {
                    ArborError::invalid(AttrField::StartDate, format!("{date} + {rule} overflows"))
                })?;
                store.set_attribute(id, AttrValue::StartDate(Some(next_date)))?;
                return Ok(TaskToggle::Rescheduled(next_date));
            }
            _ => RowKind::Done,
        },
        RowKind::Done => RowKind::Note,
        _ => RowKind::Todo,
    };
    store.set_attribute(id, AttrValue::Kind(next))?;
    Ok(TaskToggle::Kind(next))
}

/// The type `toggle_project` moves a row to.
pub fn next_project_kind(kind: RowKind) -> RowKind {
    match kind {
        RowKind::SequentialProject => RowKind::ParallelProject,
        RowKind::ParallelProject => RowKind::PausedProject,
        RowKind::PausedProject => RowKind::Note,
        RowKind::Note | RowKind::Todo | RowKind::Done => RowKind::SequentialProject,
    }
}

pub fn toggle_project(store: &mut OutlineStore, id: NodeId) -> Result<RowKind> {
    let next = next_project_kind(store.get(id)?.kind);
    store.set_attribute(id, AttrValue::Kind(next))?;
    Ok(next)
}

/// Whether a row can be worked on now, given the project it sits in.
pub fn is_task_available(store: &OutlineStore, id: NodeId) -> Result<bool> {
    if store.get(id)?.kind == RowKind::Note {
        return Ok(true);
    }
    let Some(project) = store.parent_of(id)? else {
        return Ok(true);
    };
    match store.get(project)?.kind {
        RowKind::PausedProject => Ok(false),
        RowKind::SequentialProject => Ok(next_available_task(store, project)? == Some(id)),
        _ => Ok(true),
    }
}

/// First child of `project` that is a todo or holds one somewhere below.
pub fn next_available_task(store: &OutlineStore, project: NodeId) -> Result<Option<NodeId>> {
    for child in store.children_of(project)? {
        if has_open_task(store, *child)? {
            return Ok(Some(*child));
        }
    }
    Ok(None)
}

fn has_open_task(store: &OutlineStore, id: NodeId) -> Result<bool> {
    if store.get(id)?.kind == RowKind::Todo {
        return Ok(true);
    }
    for descendant in store.descendants(id)? {
        if store.get(descendant)?.kind == RowKind::Todo {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeAttrs, RepeatRule, RepeatUnit};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn toggle_task_cycles() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let id = store.append(root, NodeAttrs::new("t")).unwrap();
        assert_eq!(toggle_task(&mut store, id).unwrap(), TaskToggle::Kind(RowKind::Todo));
        assert_eq!(toggle_task(&mut store, id).unwrap(), TaskToggle::Kind(RowKind::Done));
        assert_eq!(toggle_task(&mut store, id).unwrap(), TaskToggle::Kind(RowKind::Note));
    }

    #[test]
    fn project_becomes_todo() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let id = store
            .append(root, NodeAttrs::new("p").with_kind(RowKind::ParallelProject))
            .unwrap();
        assert_eq!(toggle_task(&mut store, id).unwrap(), TaskToggle::Kind(RowKind::Todo));
    }

    #[test]
    fn repeating_todo_is_rescheduled() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let attrs = NodeAttrs::new("water plants")
            .with_kind(RowKind::Todo)
            .with_start_date(date(2024, 3, 1))
            .with_repeat(RepeatRule::new(1, RepeatUnit::Week));
        let id = store.append(root, attrs).unwrap();

        assert_eq!(
            toggle_task(&mut store, id).unwrap(),
            TaskToggle::Rescheduled(date(2024, 3, 8))
        );
        let attrs = store.get(id).unwrap();
        assert_eq!(attrs.kind, RowKind::Todo);
        assert_eq!(attrs.start_date, Some(date(2024, 3, 8)));
    }

    #[test]
    fn repeat_without_date_completes() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let attrs = NodeAttrs::new("x")
            .with_kind(RowKind::Todo)
            .with_repeat(RepeatRule::new(1, RepeatUnit::Day));
        let id = store.append(root, attrs).unwrap();
        assert_eq!(toggle_task(&mut store, id).unwrap(), TaskToggle::Kind(RowKind::Done));
    }

    #[test]
    fn toggle_project_cycles() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let id = store
            .append(root, NodeAttrs::new("p").with_kind(RowKind::Done))
            .unwrap();
        let kinds: Vec<_> = (0..4).map(|_| toggle_project(&mut store, id).unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::SequentialProject,
                RowKind::ParallelProject,
                RowKind::PausedProject,
                RowKind::Note
            ]
        );
    }

    #[test]
    fn sequential_project_exposes_only_next_task() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let project = store
            .append(root, NodeAttrs::new("p").with_kind(RowKind::SequentialProject))
            .unwrap();
        let done = store
            .append(project, NodeAttrs::new("first").with_kind(RowKind::Done))
            .unwrap();
        let group = store.append(project, NodeAttrs::new("group")).unwrap();
        store
            .append(group, NodeAttrs::new("nested").with_kind(RowKind::Todo))
            .unwrap();
        let later = store
            .append(project, NodeAttrs::new("later").with_kind(RowKind::Todo))
            .unwrap();

        assert_eq!(next_available_task(&store, project).unwrap(), Some(group));
        assert!(!is_task_available(&store, done).unwrap());
        assert!(!is_task_available(&store, later).unwrap());
        // notes are always available
        assert!(is_task_available(&store, group).unwrap());
    }

    #[test]
    fn paused_project_blocks_tasks() {
        let mut store = OutlineStore::new();
        let root = store.root();
        let project = store
            .append(root, NodeAttrs::new("p").with_kind(RowKind::PausedProject))
            .unwrap();
        let task = store
            .append(project, NodeAttrs::new("t").with_kind(RowKind::Todo))
            .unwrap();
        assert!(!is_task_available(&store, task).unwrap());

        store.set_attribute(project, AttrValue::Kind(RowKind::ParallelProject)).unwrap();
        assert!(is_task_available(&store, task).unwrap());
    }
}
