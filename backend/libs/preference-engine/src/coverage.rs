// ============================================
// Coverage Cycler
// ============================================
//
// Round-robin guarantee over a fixed set of mandatory categories:
// every mandatory category that still has fresh items is shown once per
// cycle before free exploration takes over.
//
// State machine:
//   Exhausted --(draw attempted)--> Active   remaining = mandatory ∩ available, cycle += 1
//   (an empty intersection leaves the cycler Exhausted and the counter unchanged)
//   Active    --(last one served)--> Exhausted
//
// A mandatory category whose pool has nothing fresh left stays in
// `remaining`; the turn is served by the exploration fallback instead.

use crate::models::{Category, ItemId, ItemPool};
use crate::scoring::ScoreTracker;
use crate::selection::SelectionPolicy;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Mandatory categories still pending in this cycle
    Active,
    /// Nothing pending; the next draw starts a new cycle
    Exhausted,
}

/// How a selection was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Mandatory,
    Exploration,
    /// Weighted pick had nothing fresh; uniform pick among categories that do
    Rescue,
}

#[derive(Debug, Clone)]
pub struct CoverageCycler {
    policy: SelectionPolicy,
    mandatory: BTreeSet<Category>,
    remaining: BTreeSet<Category>,
    cycle: u64,
}

impl CoverageCycler {
    pub fn new<I>(mandatory: I) -> Self
    where
        I: IntoIterator<Item = Category>,
    {
        Self {
            policy: SelectionPolicy::new(),
            mandatory: mandatory.into_iter().collect(),
            remaining: BTreeSet::new(),
            cycle: 0,
        }
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn mandatory(&self) -> &BTreeSet<Category> {
        &self.mandatory
    }

    pub fn remaining(&self) -> &BTreeSet<Category> {
        &self.remaining
    }

    /// Number of cycles started with at least one mandatory category
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn state(&self) -> CycleState {
        if self.remaining.is_empty() {
            CycleState::Exhausted
        } else {
            CycleState::Active
        }
    }

    fn start_cycle(&mut self, pool: &ItemPool) {
        self.remaining = self
            .mandatory
            .iter()
            .filter(|category| pool.contains_key(category.as_str()))
            .cloned()
            .collect();

        if self.remaining.is_empty() {
            debug!("No mandatory category in pool, exploring freely");
            return;
        }

        self.cycle += 1;
        info!(
            cycle = self.cycle,
            mandatory = self.remaining.len(),
            "Coverage cycle started"
        );
    }

    /// Pick the next item to show, or `None` when nothing unseen is left.
    ///
    /// Marks the chosen category as shown at `now` in `tracker`.
    pub fn next_selection<R: Rng + ?Sized>(
        &mut self,
        tracker: &mut ScoreTracker,
        pool: &ItemPool,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<(ItemId, Category, SelectionSource)> {
        tracker.register(pool.keys());

        if self.state() == CycleState::Exhausted {
            self.start_cycle(pool);
        }

        if let Some(picked) = self.draw_mandatory(pool, rng) {
            tracker.mark_shown(&picked.1, now);
            return Some((picked.0, picked.1, SelectionSource::Mandatory));
        }

        let (item, category, source) = self.draw_exploration(tracker, pool, now, rng)?;
        tracker.mark_shown(&category, now);
        Some((item, category, source))
    }

    fn draw_mandatory<R: Rng + ?Sized>(
        &mut self,
        pool: &ItemPool,
        rng: &mut R,
    ) -> Option<(ItemId, Category)> {
        let pending: Vec<&Category> = self.remaining.iter().collect();
        let category = (*pending.choose(rng)?).clone();

        if !self.policy.has_fresh_item(pool, &category) {
            warn!(
                category = %category,
                cycle = self.cycle,
                "Mandatory category has no fresh items, falling back to exploration"
            );
            return None;
        }

        let item = self.policy.select_item(pool, &category, rng)?;
        self.remaining.remove(&category);

        debug!(
            category = %category,
            cycle = self.cycle,
            still_pending = self.remaining.len(),
            "Mandatory category served"
        );

        Some((item, category))
    }

    fn draw_exploration<R: Rng + ?Sized>(
        &mut self,
        tracker: &ScoreTracker,
        pool: &ItemPool,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<(ItemId, Category, SelectionSource)> {
        let scores = self.policy.exploration_scores(tracker, pool, now);

        if let Some(category) = self.policy.select_category(&scores, rng) {
            if let Some(item) = self.policy.select_item(pool, &category, rng) {
                return Some((item, category, SelectionSource::Exploration));
            }
        }

        let with_fresh: Vec<&Category> = pool
            .keys()
            .filter(|category| self.policy.has_fresh_item(pool, category))
            .collect();

        let Some(category) = with_fresh.choose(rng).map(|c| (*c).clone()) else {
            info!(
                shown = self.policy.shown().len(),
                "Every item in the pool has been shown"
            );
            return None;
        };

        let item = self.policy.select_item(pool, &category, rng)?;
        Some((item, category, SelectionSource::Rescue))
    }
}
