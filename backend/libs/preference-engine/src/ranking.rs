use crate::models::{Category, RankedCategory};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Normalises final category scores and keeps the strongest ones.
///
/// Scores are divided by the largest absolute score and scaled onto
/// `[-scale, scale]`, sorted descending, then cut to `top_n`.
#[derive(Debug, Clone)]
pub struct RankingSummarizer {
    scale: f64,
    top_n: usize,
}

impl Default for RankingSummarizer {
    fn default() -> Self {
        Self {
            scale: 10.0,
            top_n: 2,
        }
    }
}

impl RankingSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn normalize(&self, scores: &BTreeMap<Category, f64>) -> Vec<RankedCategory> {
        if scores.is_empty() {
            return Vec::new();
        }

        let max_abs = scores.values().fold(0.0_f64, |acc, s| acc.max(s.abs()));

        let mut ranked: Vec<RankedCategory> = if max_abs == 0.0 {
            // All zero: keep raw values, nothing to divide by
            scores
                .iter()
                .map(|(category, score)| RankedCategory::new(category.clone(), *score))
                .collect()
        } else {
            scores
                .iter()
                .map(|(category, score)| {
                    RankedCategory::new(category.clone(), score / max_abs * self.scale)
                })
                .collect()
        };

        // Stable sort: ties keep category order
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(self.top_n);
        ranked
    }
}
