//! # Planning
//!
//! The plan is a second, flat view over the outline: every row with a
//! [`PlanSlot`], sorted by level and then by order within the level. Rows
//! stay where they are in the tree; planning only sets the `planned`
//! attribute, so it is undoable like any other edit.
//!
//! Putting a row on a level appends it to the end of that level. Moving a row
//! up or down in the plan swaps it with its neighbour when both share a
//! level, and otherwise carries it across the level boundary.

use crate::attributes::AttrValue;
use crate::error::Result;
use crate::model::{NodeId, PlanSlot, MAX_PLAN_LEVEL};
use crate::store::OutlineStore;

/// Planned rows in plan order. Ties (equal slots) fall back to tree order.
pub fn planned_rows(store: &OutlineStore) -> Vec<(NodeId, PlanSlot)> {
    let mut rows: Vec<(NodeId, PlanSlot)> = store
        .preorder()
        .filter_map(|id| Some((id, store.get(id).ok()?.planned?)))
        .collect();
    // Stable sort keeps preorder among equal slots.
    rows.sort_by_key(|(_, slot)| *slot);
    rows
}

/// The order a row appended to `level` gets. `except` is left out so a row
/// re-planned onto its own level does not count itself.
pub fn next_order(store: &OutlineStore, level: u8, except: Option<NodeId>) -> u32 {
    planned_rows(store)
        .into_iter()
        .filter(|(id, slot)| slot.level == level && Some(*id) != except)
        .map(|(_, slot)| slot.order + 1)
        .max()
        .unwrap_or(0)
}

/// Puts `id` at the end of `level`, or takes it out of the plan for `None`.
pub fn set_plan_level(
    store: &mut OutlineStore,
    id: NodeId,
    level: Option<u8>,
) -> Result<Option<PlanSlot>> {
    let slot = match level {
        None | Some(0) => None,
        Some(level) => match store.get(id)?.planned {
            Some(current) if current.level == level => Some(current),
            _ => Some(PlanSlot::new(level, next_order(store, level, Some(id)))),
        },
    };
    store.set_attribute(id, AttrValue::Planned(slot))?;
    Ok(slot)
}

/// Moves `id` one place up (`up = true`) or down in the plan. Returns false
/// when the row is not planned or already at the edge of the plan.
pub fn move_in_plan(store: &mut OutlineStore, id: NodeId, up: bool) -> Result<bool> {
    let Some(slot) = store.get(id)?.planned else {
        return Ok(false);
    };
    let rows = planned_rows(store);
    let Some(index) = rows.iter().position(|(row, _)| *row == id) else {
        return Ok(false);
    };
    let neighbour = if up {
        index.checked_sub(1).and_then(|i| rows.get(i))
    } else {
        rows.get(index + 1)
    };

    match neighbour {
        Some(&(other, other_slot)) if other_slot.level == slot.level => {
            if other_slot.order == slot.order {
                // Equal orders would swap to the same slots; spread them first.
                renumber_level(store, slot.level)?;
                return move_in_plan(store, id, up);
            }
            store.set_attribute(id, AttrValue::Planned(Some(other_slot)))?;
            store.set_attribute(other, AttrValue::Planned(Some(slot)))?;
            Ok(true)
        }
        Some(&(_, other_slot)) => {
            // Crossing into the neighbouring level: become its last row going
            // up, its first row going down.
            let level = other_slot.level;
            let order = if up {
                other_slot.order + 1
            } else if other_slot.order > 0 {
                other_slot.order - 1
            } else {
                shift_level(store, level)?;
                0
            };
            store.set_attribute(id, AttrValue::Planned(Some(PlanSlot::new(level, order))))?;
            Ok(true)
        }
        None => {
            let level = if up {
                slot.level.checked_sub(1).filter(|l| *l >= 1)
            } else {
                Some(slot.level + 1).filter(|l| *l <= MAX_PLAN_LEVEL)
            };
            match level {
                Some(level) => {
                    store.set_attribute(id, AttrValue::Planned(Some(PlanSlot::new(level, 0))))?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }
}

/// Adds one to every order on `level`, freeing order 0.
fn shift_level(store: &mut OutlineStore, level: u8) -> Result<()> {
    for (id, slot) in planned_rows(store) {
        if slot.level == level {
            store.set_attribute(id, AttrValue::Planned(Some(PlanSlot::new(level, slot.order + 1))))?;
        }
    }
    Ok(())
}

/// Rewrites the orders on `level` as 0, 1, 2, … in current plan order.
fn renumber_level(store: &mut OutlineStore, level: u8) -> Result<()> {
    let rows: Vec<_> = planned_rows(store)
        .into_iter()
        .filter(|(_, slot)| slot.level == level)
        .collect();
    for (order, (id, _)) in (0u32..).zip(rows) {
        store.set_attribute(id, AttrValue::Planned(Some(PlanSlot::new(level, order))))?;
    }
    Ok(())
}
