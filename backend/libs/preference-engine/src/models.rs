use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Style label, e.g. "classic"
pub type Category = String;

/// Opaque item identifier, e.g. an object key
pub type ItemId = String;

/// Items available to a session, grouped by category.
///
/// Ordered so that seeded sessions draw identically across runs.
pub type ItemPool = BTreeMap<Category, Vec<ItemId>>;

/// Feedback attached to a displayed item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedbackKind {
    Like,
    Dislike,
    /// Anything else. Scored as a like.
    Unknown(String),
}

impl FeedbackKind {
    pub fn as_str(&self) -> &str {
        match self {
            FeedbackKind::Like => "like",
            FeedbackKind::Dislike => "dislike",
            FeedbackKind::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, FeedbackKind::Unknown(_))
    }
}

impl From<&str> for FeedbackKind {
    fn from(raw: &str) -> Self {
        match raw {
            "like" => FeedbackKind::Like,
            "dislike" => FeedbackKind::Dislike,
            other => FeedbackKind::Unknown(other.to_string()),
        }
    }
}

impl From<String> for FeedbackKind {
    fn from(raw: String) -> Self {
        FeedbackKind::from(raw.as_str())
    }
}

impl From<FeedbackKind> for String {
    fn from(kind: FeedbackKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item chosen for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub item: ItemId,
    pub category: Category,
    /// 1-based turn number this selection belongs to
    pub turn: usize,
    pub shown_at: DateTime<Utc>,
}

/// Result of asking for the next item
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Selected(Selection),
    /// No undisplayed item remains, or the turn limit was reached
    NoMoreItems,
}

impl TurnOutcome {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            TurnOutcome::Selected(selection) => Some(selection),
            TurnOutcome::NoMoreItems => None,
        }
    }
}

/// Returned to the caller after feedback is applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    pub score_delta: f64,
    pub resulting_score: f64,
    /// Number of completed turns including this one
    pub completed_turns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionHistoryEntry {
    pub item: ItemId,
    pub category: Category,
    pub feedback: FeedbackKind,
    pub score_delta: f64,
    pub resulting_score: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCategory {
    pub category: Category,
    /// Normalised onto [-10, 10], or the raw score when every score is zero
    pub score: f64,
}

impl RankedCategory {
    pub fn new(category: impl Into<Category>, score: f64) -> Self {
        Self {
            category: category.into(),
            score,
        }
    }
}

/// Final output of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub ranked_top_categories: Vec<RankedCategory>,
    pub history: Vec<SelectionHistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_kind_parsing() {
        assert_eq!(FeedbackKind::from("like"), FeedbackKind::Like);
        assert_eq!(FeedbackKind::from("dislike"), FeedbackKind::Dislike);
        assert_eq!(
            FeedbackKind::from("LIKE"),
            FeedbackKind::Unknown("LIKE".to_string())
        );
        assert!(!FeedbackKind::from("meh").is_recognized());
    }

    #[test]
    fn test_feedback_kind_serializes_as_plain_string() {
        let json = serde_json::to_string(&FeedbackKind::Dislike).unwrap();
        assert_eq!(json, "\"dislike\"");

        let parsed: FeedbackKind = serde_json::from_str("\"superlike\"").unwrap();
        assert_eq!(parsed, FeedbackKind::Unknown("superlike".to_string()));
    }
}
