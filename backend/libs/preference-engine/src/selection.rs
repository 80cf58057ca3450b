// ============================================
// Selection Policy
// ============================================
//
// Explore-exploit balance across categories:
//
//   exploration(c) = max(score(c) + BASELINE, 0)                 preference, floored
//                  + EXPLORATION_FACTOR / (interactions(c) + 1)  under-sampling bonus
//                  + 0.1 * clamp(hours since shown(c), 0, 1)     staleness bonus
//
// A category is drawn with probability proportional to its exploration
// score, then an item is drawn uniformly from that category, skipping
// everything already shown in this session.

use crate::clock::hours_between;
use crate::models::{Category, ItemId, ItemPool};
use crate::scoring::ScoreTracker;
use chrono::{DateTime, Utc};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Cap on the staleness bonus
const STALENESS_BONUS: f64 = 0.1;

/// Items already served in one session. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShownSet {
    items: BTreeSet<ItemId>,
}

impl ShownSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    /// Returns false if the item was already present.
    pub fn insert(&mut self, item: ItemId) -> bool {
        self.items.insert(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.items.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    shown: ShownSet,
}

impl SelectionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> &ShownSet {
        &self.shown
    }

    /// Exploration weight of every category with a non-empty pool
    pub fn exploration_scores(
        &self,
        tracker: &ScoreTracker,
        pool: &ItemPool,
        now: DateTime<Utc>,
    ) -> BTreeMap<Category, f64> {
        let params = tracker.params();

        pool.iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, _)| {
                let preference = (tracker.score(category) + params.baseline).max(0.0);
                let under_sampled = params.exploration_factor
                    / (f64::from(tracker.interaction_count(category)) + 1.0);
                let staleness = match tracker.last_shown_at(category) {
                    Some(shown_at) => hours_between(shown_at, now).clamp(0.0, 1.0),
                    None => 1.0,
                };
                let score = preference + under_sampled + STALENESS_BONUS * staleness;
                (category.clone(), score)
            })
            .collect()
    }

    /// Weighted draw over `scores`. Uniform when all weights are zero.
    pub fn select_category<R: Rng + ?Sized>(
        &self,
        scores: &BTreeMap<Category, f64>,
        rng: &mut R,
    ) -> Option<Category> {
        if scores.is_empty() {
            return None;
        }

        let categories: Vec<&Category> = scores.keys().collect();
        let total: f64 = scores.values().sum();

        if total == 0.0 {
            debug!(candidates = categories.len(), "All exploration weights zero, drawing uniformly");
            return categories.choose(rng).map(|c| (*c).clone());
        }

        match WeightedIndex::<f64>::new(scores.values()) {
            Ok(dist) => Some(categories[dist.sample(rng)].clone()),
            Err(e) => {
                warn!(error = %e, "Invalid exploration weights, drawing uniformly");
                categories.choose(rng).map(|c| (*c).clone())
            }
        }
    }

    /// True if `category` still has an item not yet shown this session.
    pub fn has_fresh_item(&self, pool: &ItemPool, category: &str) -> bool {
        pool.get(category)
            .map_or(false, |items| items.iter().any(|item| !self.shown.contains(item)))
    }

    /// Draw an unseen item from `category` and record it as shown.
    ///
    /// `None` means the category has nothing fresh left; try another one.
    pub fn select_item<R: Rng + ?Sized>(
        &mut self,
        pool: &ItemPool,
        category: &str,
        rng: &mut R,
    ) -> Option<ItemId> {
        let fresh: Vec<&ItemId> = pool
            .get(category)?
            .iter()
            .filter(|item| !self.shown.contains(item))
            .collect();

        let item = (*fresh.choose(rng)?).clone();
        self.shown.insert(item.clone());

        debug!(
            category = category,
            item = %item,
            remaining = fresh.len() - 1,
            "Item selected"
        );

        Some(item)
    }
}
