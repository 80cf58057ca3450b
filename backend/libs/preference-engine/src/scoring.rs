// ============================================
// Score Tracker
// ============================================
//
// Per-category preference state for one session:
// - score: signed, decays toward 0 on every feedback event
// - interaction_count: +1 per feedback event for that category
// - last_shown_at: set by the selection side when an item is displayed
//
// Update rule for feedback on category c:
//   decay_modifier  = clamp(hours since c was last shown, 0.5, 1.0)
//   other scores   *= DECAY_FACTOR ^ decay_modifier
//   adjusted_weight = base_weight * RECENCY_WEIGHT * (1 + 1 / max(1, count[c]))
//   score[c]        = score[c] * DECAY_FACTOR + adjusted_weight

use crate::clock::hours_between;
use crate::models::{Category, FeedbackKind};
use crate::params::AlgorithmParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Tracked state of a single category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub score: f64,
    pub interaction_count: u32,
    /// `None` until an item of this category is displayed
    pub last_shown_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ScoreTracker {
    params: AlgorithmParams,
    stats: BTreeMap<Category, CategoryStats>,
}

impl ScoreTracker {
    pub fn new(params: AlgorithmParams) -> Self {
        Self {
            params,
            stats: BTreeMap::new(),
        }
    }

    pub fn params(&self) -> &AlgorithmParams {
        &self.params
    }

    /// Make sure each category has a score, starting at 0.0.
    pub fn register<'a, I>(&mut self, categories: I)
    where
        I: IntoIterator<Item = &'a Category>,
    {
        for category in categories {
            self.entry(category);
        }
    }

    fn entry(&mut self, category: &str) -> &mut CategoryStats {
        self.stats.entry(category.to_string()).or_default()
    }

    pub fn stats(&self, category: &str) -> Option<&CategoryStats> {
        self.stats.get(category)
    }

    pub fn score(&self, category: &str) -> f64 {
        self.stats.get(category).map_or(0.0, |s| s.score)
    }

    pub fn interaction_count(&self, category: &str) -> u32 {
        self.stats.get(category).map_or(0, |s| s.interaction_count)
    }

    pub fn last_shown_at(&self, category: &str) -> Option<DateTime<Utc>> {
        self.stats.get(category).and_then(|s| s.last_shown_at)
    }

    /// Every known category with its current score
    pub fn scores(&self) -> BTreeMap<Category, f64> {
        self.stats
            .iter()
            .map(|(category, stats)| (category.clone(), stats.score))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Decay multiplier exponent in [0.5, 1.0].
    ///
    /// A category never shown behaves as if shown infinitely long ago.
    pub fn decay_factor(&self, category: &str, now: DateTime<Utc>) -> f64 {
        match self.last_shown_at(category) {
            Some(shown_at) => hours_between(shown_at, now).clamp(0.5, 1.0),
            None => 1.0,
        }
    }

    /// Record that an item of `category` was displayed at `now`.
    pub fn mark_shown(&mut self, category: &str, now: DateTime<Utc>) {
        let stats = self.entry(category);
        stats.last_shown_at = Some(match stats.last_shown_at {
            Some(previous) if previous > now => previous,
            _ => now,
        });
    }

    /// Base weight for a feedback kind. Unknown kinds count as likes.
    pub fn feedback_weight(&self, feedback: &FeedbackKind) -> f64 {
        match feedback {
            FeedbackKind::Like => self.params.w_like,
            FeedbackKind::Dislike => self.params.w_dislike,
            FeedbackKind::Unknown(raw) => {
                warn!(feedback = %raw, "Unrecognized feedback kind, scoring as like");
                self.params.w_like
            }
        }
    }

    /// Apply one feedback event and return the weight added to `category`.
    pub fn update(&mut self, category: &str, feedback: &FeedbackKind, now: DateTime<Utc>) -> f64 {
        let decay_factor = self.params.decay_factor;
        let recency_weight = self.params.recency_weight;

        let interaction_count = {
            let stats = self.entry(category);
            stats.interaction_count += 1;
            stats.interaction_count
        };

        let decay_modifier = self.decay_factor(category, now);
        let other_decay = decay_factor.powf(decay_modifier);
        for (name, stats) in self.stats.iter_mut() {
            if name != category {
                stats.score *= other_decay;
            }
        }

        let base_weight = self.feedback_weight(feedback);
        let interaction_factor = (1.0 / f64::from(interaction_count.max(1))).min(1.0);
        let adjusted_weight = base_weight * recency_weight * (1.0 + interaction_factor);

        let stats = self.entry(category);
        stats.score = stats.score * decay_factor + adjusted_weight;

        debug!(
            category = category,
            feedback = %feedback,
            interaction_count = interaction_count,
            decay_modifier = decay_modifier,
            adjusted_weight = adjusted_weight,
            score = stats.score,
            "Category score updated"
        );

        adjusted_weight
    }
}
