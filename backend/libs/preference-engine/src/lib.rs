//! Adaptive style preference engine
//!
//! Picks the next item to show from a pool grouped into categories, learns
//! per-category preference scores from like/dislike feedback, and summarises
//! the strongest categories once the session ends.
//!
//! Components, leaf-first:
//! - **ScoreTracker**: per-category score, interaction count and last-shown time
//! - **SelectionPolicy**: exploration-weighted category draw and deduplicated item draw
//! - **CoverageCycler**: guarantees every mandatory category is sampled once per cycle
//! - **RankingSummarizer**: normalises final scores onto [-10, 10] and keeps the top two
//! - **SessionController**: drives select → feedback → update turns for one session
//!
//! # Example
//!
//! ```rust
//! use preference_engine::{
//!     AlgorithmParams, FeedbackKind, ItemPool, SessionController, SessionSettings, TurnOutcome,
//! };
//!
//! let mut pool = ItemPool::new();
//! pool.insert("classic".to_string(), vec!["classic/1.jpg".to_string()]);
//! pool.insert("street".to_string(), vec!["street/1.jpg".to_string()]);
//!
//! let settings = SessionSettings::new(vec!["classic".to_string()]).with_seed(7);
//! let mut session = SessionController::new("women", AlgorithmParams::reference(), settings);
//!
//! if let TurnOutcome::Selected(selection) = session.next_turn(&pool) {
//!     session
//!         .submit_feedback(&selection.item, &selection.category, FeedbackKind::Like)
//!         .unwrap();
//! }
//!
//! let summary = session.finalize();
//! assert_eq!(summary.history.len(), 1);
//! ```

pub mod clock;
pub mod coverage;
pub mod error;
pub mod models;
pub mod params;
pub mod ranking;
pub mod scoring;
pub mod selection;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coverage::CoverageCycler;
pub use error::{EngineError, Result};
pub use models::{
    Category, FeedbackKind, FeedbackOutcome, ItemId, ItemPool, RankedCategory, Selection,
    SelectionHistoryEntry, SessionSummary, TurnOutcome,
};
pub use params::{AlgorithmParams, SessionSettings};
pub use ranking::RankingSummarizer;
pub use scoring::ScoreTracker;
pub use selection::{SelectionPolicy, ShownSet};
pub use session::{FeedbackSource, SessionController};
