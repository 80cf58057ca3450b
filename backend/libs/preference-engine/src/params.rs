use crate::error::{EngineError, Result};
use crate::models::Category;
use serde::{Deserialize, Serialize};

/// Number of turns in a reference quiz session
pub const DEFAULT_MAX_TURNS: usize = 30;

/// Scoring and exploration constants
///
/// All six values are required. There is intentionally no `Default` impl;
/// use [`AlgorithmParams::reference`] for the values the production quiz ships with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmParams {
    /// Base weight of a like
    pub w_like: f64,
    /// Base weight of a dislike (normally negative)
    pub w_dislike: f64,
    /// Multiplicative decay, strictly inside (0, 1)
    pub decay_factor: f64,
    /// Offset added to a score before flooring it at zero for exploration
    pub baseline: f64,
    /// Multiplier applied to every feedback weight
    pub recency_weight: f64,
    /// Scale of the under-sampling bonus
    pub exploration_factor: f64,
}

impl AlgorithmParams {
    pub fn new(
        w_like: f64,
        w_dislike: f64,
        decay_factor: f64,
        baseline: f64,
        recency_weight: f64,
        exploration_factor: f64,
    ) -> Result<Self> {
        let params = Self {
            w_like,
            w_dislike,
            decay_factor,
            baseline,
            recency_weight,
            exploration_factor,
        };
        params.validate()?;
        Ok(params)
    }

    /// Values used by the production style quiz
    pub fn reference() -> Self {
        Self {
            w_like: 1.0,
            w_dislike: -0.5,
            decay_factor: 0.98,
            baseline: 0.5,
            recency_weight: 1.2,
            exploration_factor: 0.2,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let named = [
            ("W_LIKE", self.w_like),
            ("W_DISLIKE", self.w_dislike),
            ("DECAY_FACTOR", self.decay_factor),
            ("BASELINE", self.baseline),
            ("RECENCY_WEIGHT", self.recency_weight),
            ("EXPLORATION_FACTOR", self.exploration_factor),
        ];

        if let Some((name, value)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EngineError::InvalidParams(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }

        // Outside (0, 1) scores can grow without bound
        if self.decay_factor <= 0.0 || self.decay_factor >= 1.0 {
            return Err(EngineError::InvalidParams(format!(
                "DECAY_FACTOR must lie in (0, 1), got {}",
                self.decay_factor
            )));
        }

        Ok(())
    }
}

/// Per-session settings that are not scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Turns after which the session stops asking for items
    pub max_turns: usize,
    /// Categories that must each be shown once per coverage cycle
    pub mandatory_categories: Vec<Category>,
    /// Fixed RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl SessionSettings {
    pub fn new(mandatory_categories: Vec<Category>) -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            mandatory_categories,
            seed: None,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_params_are_valid() {
        assert!(AlgorithmParams::reference().validate().is_ok());
    }

    #[test]
    fn test_decay_factor_bounds() {
        assert!(AlgorithmParams::new(1.0, -0.5, 1.0, 0.5, 1.2, 0.2).is_err());
        assert!(AlgorithmParams::new(1.0, -0.5, 0.0, 0.5, 1.2, 0.2).is_err());
        assert!(AlgorithmParams::new(1.0, -0.5, 0.5, 0.5, 1.2, 0.2).is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = AlgorithmParams::new(f64::NAN, -0.5, 0.98, 0.5, 1.2, 0.2).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParams(msg) if msg.contains("W_LIKE")));
    }

    #[test]
    fn test_session_settings_builder() {
        let settings = SessionSettings::new(vec!["modern".to_string()])
            .with_max_turns(5)
            .with_seed(42);
        assert_eq!(settings.max_turns, 5);
        assert_eq!(settings.seed, Some(42));
    }
}
