use chrono::NaiveDate;

use super::spec::{fold_case, FilterSpec};
use crate::error::Result;
use crate::model::{NodeAttrs, NodeId, RowKind};
use crate::store::OutlineStore;
use crate::tasks::is_task_available;

/// A [`FilterSpec`] compiled for evaluation against rows.
#[derive(Debug, Clone)]
pub struct Predicate<'a> {
    spec: &'a FilterSpec,
    terms: Vec<String>,
    today: NaiveDate,
}

impl<'a> Predicate<'a> {
    pub fn new(spec: &'a FilterSpec, today: NaiveDate) -> Self {
        Self {
            spec,
            terms: spec.terms(),
            today,
        }
    }

    /// Every dimension that only looks at the row's own attributes.
    pub fn matches_attrs(&self, attrs: &NodeAttrs) -> bool {
        let spec = self.spec;

        if let Some(tag) = &spec.tag {
            if !attrs.effective_tags().contains(tag) {
                return false;
            }
        }
        if spec.hide_tagged && attrs.has_any_tag() {
            return false;
        }
        if spec.color.is_some_and(|color| attrs.color != color) {
            return false;
        }
        if let Some(cutoff) = spec.date_until {
            if attrs.start_date.is_some_and(|date| date > cutoff) {
                return false;
            }
        }
        if spec.hide_future && attrs.start_date.is_some_and(|date| date > self.today) {
            return false;
        }
        if spec.only_dated && attrs.start_date.is_none() {
            return false;
        }
        if let Some(bucket) = spec.estimate {
            if !attrs.estimate.is_some_and(|minutes| bucket.contains(minutes)) {
                return false;
            }
        }
        if spec.kind.is_some_and(|kind| attrs.kind != kind) {
            return false;
        }
        if !self.terms.is_empty() {
            let text = fold_case(&attrs.text);
            if !self.terms.iter().all(|term| text.contains(term.as_str())) {
                return false;
            }
        }
        true
    }

    /// Full test for a row, including task availability for `t=t`.
    pub fn matches(&self, store: &OutlineStore, id: NodeId) -> Result<bool> {
        if !self.matches_attrs(store.get(id)?) {
            return Ok(false);
        }
        if self.spec.kind == Some(RowKind::Todo) {
            return is_task_available(store, id);
        }
        Ok(true)
    }
}
