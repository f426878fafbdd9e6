use chrono::{Local, NaiveDate};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::predicate::Predicate;
use super::projection::Projection;
use super::spec::FilterSpec;
use crate::model::NodeId;
use crate::store::OutlineStore;

/// Computes the projection for the active spec.
///
/// `candidates` restricts evaluation to a known superset of the result (the
/// previous matches when typing ahead). `cache` maps a row to the version it
/// was evaluated at and the outcome. `cancelled` is polled between rows.
/// Returns `None` if cancelled.
pub(crate) fn evaluate(
    store: &OutlineStore,
    spec: &FilterSpec,
    today: NaiveDate,
    candidates: Option<&HashSet<NodeId>>,
    cache: &mut HashMap<NodeId, (u64, bool)>,
    cancelled: &dyn Fn() -> bool,
) -> Option<(Projection, usize)> {
    let predicate = Predicate::new(spec, today);
    let use_cache = !spec.depends_on_structure();
    let mut evaluated = 0;
    let mut matched = HashSet::new();
    let mut fresh_cache = HashMap::new();

    let mut visit = |id: NodeId| -> Option<()> {
        if cancelled() {
            return None;
        }
        let Ok(version) = store.version(id) else {
            return Some(());
        };
        let hit = match cache.get(&id) {
            Some((cached_version, outcome)) if use_cache && *cached_version == version => {
                Some(*outcome)
            }
            _ => None,
        };
        let outcome = match hit {
            Some(outcome) => outcome,
            None => {
                evaluated += 1;
                predicate.matches(store, id).unwrap_or(false)
            }
        };
        if use_cache {
            fresh_cache.insert(id, (version, outcome));
        }
        if outcome {
            matched.insert(id);
        }
        Some(())
    };

    match candidates {
        Some(candidates) => {
            for id in candidates.iter().copied().filter(|id| store.contains(*id)) {
                visit(id)?;
            }
        }
        None => {
            for id in store.preorder() {
                visit(id)?;
            }
        }
    }

    *cache = fresh_cache;
    Some((Projection::from_matches(store, matched), evaluated))
}

/// Owns the active [`FilterSpec`] and keeps its [`Projection`] current.
///
/// Each spec change starts a new generation. The projection is recomputed
/// lazily when the generation or the store's filter revision moved since the
/// last computation.
#[derive(Debug)]
pub struct FilterEngine {
    spec: FilterSpec,
    generation: u64,
    today: NaiveDate,
    cache: HashMap<NodeId, (u64, bool)>,
    projection: Option<CachedProjection>,
    /// Previous matches a narrowed text query may start from.
    narrow_from: Option<(u64, HashSet<NodeId>)>,
    last_evaluated: usize,
}

#[derive(Debug)]
struct CachedProjection {
    generation: u64,
    filter_revision: u64,
    projection: Projection,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Self {
            spec: FilterSpec::default(),
            generation: 0,
            today,
            cache: HashMap::new(),
            projection: None,
            narrow_from: None,
            last_evaluated: 0,
        }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Rows evaluated by the last recomputation (cache hits excluded).
    pub fn last_evaluated(&self) -> usize {
        self.last_evaluated
    }

    /// Replaces the active spec. Returns the new generation, or the current
    /// one if the spec is unchanged.
    pub fn set_spec(&mut self, spec: FilterSpec) -> u64 {
        if spec == self.spec {
            return self.generation;
        }
        self.narrow_from = match self.projection.take() {
            Some(cached) if spec.narrows(&self.spec) && cached.generation == self.generation => {
                Some((cached.filter_revision, cached.projection.matched().clone()))
            }
            _ => None,
        };
        self.spec = spec;
        self.cache.clear();
        self.generation += 1;
        debug!(generation = self.generation, query = %self.spec, "filter changed");
        self.generation
    }

    /// Moves "today" forward, which matters to `hide_future`.
    pub fn set_today(&mut self, today: NaiveDate) {
        if today == self.today {
            return;
        }
        self.today = today;
        self.cache.clear();
        self.projection = None;
        self.narrow_from = None;
        self.generation += 1;
    }

    pub fn clear(&mut self) -> u64 {
        self.set_spec(FilterSpec::default())
    }

    /// Drops everything cached, e.g. after the store was replaced wholesale.
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.projection = None;
        self.narrow_from = None;
    }

    /// The projection for the active spec against `store`.
    pub fn projection(&mut self, store: &OutlineStore) -> &Projection {
        let cached = self.projection.take().filter(|cached| {
            cached.generation == self.generation
                && cached.filter_revision == store.filter_revision()
        });
        let cached = match cached {
            Some(cached) => cached,
            None => CachedProjection {
                generation: self.generation,
                filter_revision: store.filter_revision(),
                projection: self.recompute(store),
            },
        };
        &self.projection.insert(cached).projection
    }

    fn recompute(&mut self, store: &OutlineStore) -> Projection {
        let narrowed = self
            .narrow_from
            .take()
            .filter(|(revision, _)| *revision == store.filter_revision())
            .map(|(_, candidates)| candidates);
        let never = || false;
        let (projection, evaluated) = evaluate(
            store,
            &self.spec,
            self.today,
            narrowed.as_ref(),
            &mut self.cache,
            &never,
        )
        .unwrap_or_default();
        self.last_evaluated = evaluated;
        debug!(
            generation = self.generation,
            matched = projection.matched().len(),
            visible = projection.len(),
            evaluated,
            narrowed = narrowed.is_some(),
            "projection recomputed"
        );
        projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttrValue;
    use crate::model::{Color, NodeAttrs};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn grocery_store() -> (OutlineStore, Vec<NodeId>) {
        let mut store = OutlineStore::new();
        let root = store.root();
        let ids = ["buy milk", "buy bread", "call bob", "build shed"]
            .into_iter()
            .map(|text| store.append(root, NodeAttrs::new(text)).unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn empty_spec_shows_every_row() {
        let (store, ids) = grocery_store();
        let mut engine = FilterEngine::with_today(today());
        let projection = engine.projection(&store);
        assert_eq!(projection.len(), ids.len());
    }

    #[test]
    fn projection_is_cached_until_store_changes() {
        let (mut store, ids) = grocery_store();
        let mut engine = FilterEngine::with_today(today());
        engine.set_spec(FilterSpec::new().with_color(Color::Red));
        assert!(engine.projection(&store).is_empty());
        assert_eq!(engine.last_evaluated(), 4);

        engine.projection(&store);
        assert_eq!(engine.last_evaluated(), 4);

        store
            .set_attribute(ids[2], AttrValue::Color(Color::Red))
            .unwrap();
        assert!(engine.projection(&store).is_visible(ids[2]));
        // only the edited row is re-evaluated
        assert_eq!(engine.last_evaluated(), 1);
    }

    #[test]
    fn view_state_edits_keep_the_projection() {
        let (mut store, ids) = grocery_store();
        let mut engine = FilterEngine::with_today(today());
        engine.set_spec(FilterSpec::new().with_text("buy"));
        engine.projection(&store);
        assert_eq!(engine.last_evaluated(), 4);
        store.set_attribute(ids[0], AttrValue::Collapsed(true)).unwrap();
        engine.projection(&store);
        // no recomputation: it would have re-evaluated the collapsed row
        assert_eq!(engine.last_evaluated(), 4);
    }

    #[test]
    fn typeahead_only_scans_previous_matches() {
        let (store, ids) = grocery_store();
        let mut engine = FilterEngine::with_today(today());

        engine.set_spec(FilterSpec::new().with_text("bu"));
        assert_eq!(engine.projection(&store).matched().len(), 3);

        engine.set_spec(FilterSpec::new().with_text("buy"));
        let matched = engine.projection(&store).matched().clone();
        assert_eq!(matched, HashSet::from([ids[0], ids[1]]));
        assert_eq!(engine.last_evaluated(), 3);

        engine.set_spec(FilterSpec::new().with_text("buy m"));
        assert_eq!(
            engine.projection(&store).matched(),
            &HashSet::from([ids[0]])
        );
        assert_eq!(engine.last_evaluated(), 2);
    }

    #[test]
    fn work_tag_shows_only_the_tagged_row() {
        let scenario = crate::test_utils::work_home_scenario();
        let mut engine = FilterEngine::with_today(today());
        engine.set_spec(FilterSpec::new().with_tag("work"));
        let projection = engine.projection(&scenario.store);
        assert_eq!(projection.visible(), &HashSet::from([scenario.a]));
        assert!(!projection.is_visible(scenario.b));
        assert!(!projection.is_visible(scenario.c));
    }

    #[test]
    fn unchanged_spec_keeps_generation() {
        let mut engine = FilterEngine::with_today(today());
        let generation = engine.set_spec(FilterSpec::new().with_text("x"));
        assert_eq!(engine.set_spec(FilterSpec::new().with_text("x")), generation);
        assert_eq!(engine.clear(), generation + 1);
    }
}
