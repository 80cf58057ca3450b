// ============================================
// Session Controller
// ============================================
//
// One user session: a fixed number of select → feedback → update turns.
//
// Each session owns its own ScoreTracker, CoverageCycler (and through it
// the SelectionPolicy and ShownSet) and RNG. Nothing is shared between
// sessions; hosts that keep many sessions alive must lock each one
// independently.

use crate::clock::{Clock, SystemClock};
use crate::coverage::CoverageCycler;
use crate::error::{EngineError, Result};
use crate::models::{
    FeedbackKind, FeedbackOutcome, ItemPool, Selection, SelectionHistoryEntry, SessionSummary,
    TurnOutcome,
};
use crate::params::{AlgorithmParams, SessionSettings};
use crate::ranking::RankingSummarizer;
use crate::scoring::ScoreTracker;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Supplies feedback for a displayed item.
///
/// Returning `None` means no feedback arrived for the turn (e.g. the user
/// timed out); the turn is consumed without a score update.
pub trait FeedbackSource {
    fn feedback(&mut self, selection: &Selection) -> Option<FeedbackKind>;
}

impl<F> FeedbackSource for F
where
    F: FnMut(&Selection) -> Option<FeedbackKind>,
{
    fn feedback(&mut self, selection: &Selection) -> Option<FeedbackKind> {
        self(selection)
    }
}

pub struct SessionController {
    segment: String,
    settings: SessionSettings,
    tracker: ScoreTracker,
    cycler: CoverageCycler,
    summarizer: RankingSummarizer,
    rng: StdRng,
    clock: Arc<dyn Clock>,
    history: Vec<SelectionHistoryEntry>,
    pending: Option<Selection>,
    turns_served: usize,
    exhausted: bool,
}

impl SessionController {
    pub fn new(segment: impl Into<String>, params: AlgorithmParams, settings: SessionSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let cycler = CoverageCycler::new(settings.mandatory_categories.iter().cloned());
        let segment = segment.into();

        info!(
            segment = %segment,
            max_turns = settings.max_turns,
            mandatory = settings.mandatory_categories.len(),
            seeded = settings.seed.is_some(),
            "Preference session created"
        );

        Self {
            segment,
            settings,
            tracker: ScoreTracker::new(params),
            cycler,
            summarizer: RankingSummarizer::new(),
            rng,
            clock: Arc::new(SystemClock),
            history: Vec::new(),
            pending: None,
            turns_served: 0,
            exhausted: false,
        }
    }

    /// Replace the wall clock, mainly for tests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn tracker(&self) -> &ScoreTracker {
        &self.tracker
    }

    pub fn cycler(&self) -> &CoverageCycler {
        &self.cycler
    }

    pub fn history(&self) -> &[SelectionHistoryEntry] {
        &self.history
    }

    /// Item currently on display and awaiting feedback
    pub fn pending(&self) -> Option<&Selection> {
        self.pending.as_ref()
    }

    /// Turns that received feedback
    pub fn completed_turns(&self) -> usize {
        self.history.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Turn limit reached or nothing left to show
    pub fn is_complete(&self) -> bool {
        self.exhausted || self.completed_turns() >= self.settings.max_turns
    }

    /// Choose the next item to present.
    ///
    /// An item still awaiting feedback is abandoned: it stays in the shown
    /// set but its category score is left untouched.
    pub fn next_turn(&mut self, pool: &ItemPool) -> TurnOutcome {
        if self.completed_turns() >= self.settings.max_turns {
            debug!(segment = %self.segment, "Turn limit reached");
            return TurnOutcome::NoMoreItems;
        }

        if let Some(abandoned) = self.pending.take() {
            debug!(
                item = %abandoned.item,
                category = %abandoned.category,
                "Previous turn received no feedback"
            );
        }

        let now = self.clock.now();
        let Some((item, category, source)) =
            self.cycler
                .next_selection(&mut self.tracker, pool, now, &mut self.rng)
        else {
            self.exhausted = true;
            info!(
                segment = %self.segment,
                completed_turns = self.completed_turns(),
                "No more unique items, ending session early"
            );
            return TurnOutcome::NoMoreItems;
        };

        self.turns_served += 1;
        let selection = Selection {
            item,
            category,
            turn: self.completed_turns() + 1,
            shown_at: now,
        };

        debug!(
            item = %selection.item,
            category = %selection.category,
            turn = selection.turn,
            source = ?source,
            cycle = self.cycler.cycle(),
            "Next item selected"
        );

        self.pending = Some(selection.clone());
        TurnOutcome::Selected(selection)
    }

    /// Drop the item on display without scoring it.
    pub fn skip_turn(&mut self) -> Option<Selection> {
        self.pending.take()
    }

    /// Apply feedback for the item currently on display.
    pub fn submit_feedback(
        &mut self,
        item: &str,
        category: &str,
        feedback: FeedbackKind,
    ) -> Result<FeedbackOutcome> {
        if self.completed_turns() >= self.settings.max_turns {
            return Err(EngineError::SessionComplete(self.completed_turns()));
        }

        let pending = self.pending.as_ref().ok_or(EngineError::NoPendingTurn)?;
        if pending.item != item || pending.category != category {
            return Err(EngineError::ItemMismatch {
                expected_item: pending.item.clone(),
                expected_category: pending.category.clone(),
                got_item: item.to_string(),
                got_category: category.to_string(),
            });
        }

        let now = self.clock.now();
        let score_delta = self.tracker.update(category, &feedback, now);
        let resulting_score = self.tracker.score(category);

        self.history.push(SelectionHistoryEntry {
            item: item.to_string(),
            category: category.to_string(),
            feedback,
            score_delta,
            resulting_score,
            timestamp: now,
        });
        self.pending = None;

        Ok(FeedbackOutcome {
            score_delta,
            resulting_score,
            completed_turns: self.completed_turns(),
        })
    }

    /// Ranked top categories plus the ordered history so far
    pub fn finalize(&self) -> SessionSummary {
        let ranked_top_categories = self.summarizer.normalize(&self.tracker.scores());

        info!(
            segment = %self.segment,
            completed_turns = self.completed_turns(),
            served = self.turns_served,
            top = ?ranked_top_categories.first().map(|r| r.category.as_str()),
            "Preference session finalized"
        );

        SessionSummary {
            ranked_top_categories,
            history: self.history.clone(),
        }
    }

    /// Drive the whole session against `source` and summarise it.
    ///
    /// Runs at most `max_turns` turns and stops early on exhaustion.
    pub fn run<S: FeedbackSource + ?Sized>(&mut self, pool: &ItemPool, source: &mut S) -> SessionSummary {
        for _ in 0..self.settings.max_turns {
            let selection = match self.next_turn(pool) {
                TurnOutcome::Selected(selection) => selection,
                TurnOutcome::NoMoreItems => break,
            };

            match source.feedback(&selection) {
                Some(feedback) => {
                    if let Err(e) =
                        self.submit_feedback(&selection.item, &selection.category, feedback)
                    {
                        warn!(error = %e, "Feedback rejected");
                    }
                }
                None => {
                    self.skip_turn();
                }
            }
        }

        self.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn pool(categories: &[&str], per_category: usize) -> ItemPool {
        categories
            .iter()
            .map(|c| {
                let items = (0..per_category).map(|i| format!("{}-{}", c, i)).collect();
                (c.to_string(), items)
            })
            .collect()
    }

    fn session(mandatory: &[&str], max_turns: usize) -> SessionController {
        let settings = SessionSettings::new(mandatory.iter().map(|c| c.to_string()).collect())
            .with_max_turns(max_turns)
            .with_seed(99);
        SessionController::new("women", AlgorithmParams::reference(), settings)
    }

    #[test]
    fn test_feedback_records_history() {
        let mut session = session(&["a"], 5);
        let pool = pool(&["a", "b"], 3);

        let selection = session.next_turn(&pool).selection().cloned().unwrap();
        assert_eq!(selection.category, "a");
        assert_eq!(selection.turn, 1);

        let outcome = session
            .submit_feedback(&selection.item, &selection.category, FeedbackKind::Like)
            .unwrap();
        assert!((outcome.score_delta - 2.4).abs() < 1e-9);
        assert_eq!(outcome.completed_turns, 1);

        let entry = &session.history()[0];
        assert_eq!(entry.item, selection.item);
        assert_eq!(entry.feedback, FeedbackKind::Like);
        assert!((entry.resulting_score - outcome.resulting_score).abs() < 1e-12);
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_feedback_without_pending_turn() {
        let mut session = session(&[], 5);
        let err = session
            .submit_feedback("x", "a", FeedbackKind::Like)
            .unwrap_err();
        assert_eq!(err, EngineError::NoPendingTurn);
    }

    #[test]
    fn test_feedback_for_wrong_item() {
        let mut session = session(&[], 5);
        let pool = pool(&["a"], 3);
        session.next_turn(&pool);

        let err = session
            .submit_feedback("not-shown", "a", FeedbackKind::Dislike)
            .unwrap_err();
        assert!(matches!(err, EngineError::ItemMismatch { .. }));
        assert_eq!(session.tracker().interaction_count("a"), 0);
    }

    #[test]
    fn test_turn_limit() {
        let mut session = session(&[], 2);
        let pool = pool(&["a"], 10);

        for _ in 0..2 {
            let selection = session.next_turn(&pool).selection().cloned().unwrap();
            session
                .submit_feedback(&selection.item, &selection.category, FeedbackKind::Like)
                .unwrap();
        }

        assert!(session.is_complete());
        assert_eq!(session.next_turn(&pool), TurnOutcome::NoMoreItems);
        assert!(!session.is_exhausted());
    }

    #[test]
    fn test_abandoned_turn_is_not_scored() {
        let mut session = session(&[], 5);
        let pool = pool(&["a"], 3);

        let first = session.next_turn(&pool).selection().cloned().unwrap();
        let second = session.next_turn(&pool).selection().cloned().unwrap();

        assert_ne!(first.item, second.item);
        assert_eq!(second.turn, 1);
        assert!(session.submit_feedback(&first.item, "a", FeedbackKind::Like).is_err());
        assert_eq!(session.tracker().interaction_count("a"), 0);
    }

    #[test]
    fn test_manual_clock_drives_timestamps() {
        let start = Utc.with_ymd_and_hms(2024, 2, 2, 8, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let mut session = session(&[], 5).with_clock(clock.clone());
        let pool = pool(&["a"], 3);

        let selection = session.next_turn(&pool).selection().cloned().unwrap();
        assert_eq!(selection.shown_at, start);

        clock.advance(Duration::seconds(20));
        session
            .submit_feedback(&selection.item, &selection.category, FeedbackKind::Dislike)
            .unwrap();
        assert_eq!(session.history()[0].timestamp, start + Duration::seconds(20));
    }

    #[test]
    fn test_run_with_closure_source() {
        let mut session = session(&["a", "b"], 6);
        let pool = pool(&["a", "b", "c"], 4);

        let mut turn = 0;
        let summary = session.run(&pool, &mut |selection: &Selection| {
            turn += 1;
            if selection.category == "a" {
                Some(FeedbackKind::Like)
            } else {
                Some(FeedbackKind::Dislike)
            }
        });

        assert_eq!(turn, 6);
        assert_eq!(summary.history.len(), 6);
        // Only "a" ever gets a positive score
        assert_eq!(summary.ranked_top_categories[0].category, "a");
    }

    #[test]
    fn test_run_skips_turns_without_feedback() {
        let mut session = session(&[], 4);
        let pool = pool(&["a"], 10);

        let mut calls = 0;
        let summary = session.run(&pool, &mut |_: &Selection| {
            calls += 1;
            (calls > 1).then_some(FeedbackKind::Like)
        });

        assert_eq!(summary.history.len(), 3);
        assert_eq!(session.tracker().interaction_count("a"), 3);
        assert_eq!(session.cycler().policy().shown().len(), 4);
    }
}
