use thiserror::Error;

/// Engine errors
///
/// Exhaustion and unknown feedback kinds are deliberately absent: the first is
/// reported as `TurnOutcome::NoMoreItems`, the second is scored as a like.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid algorithm parameters: {0}")]
    InvalidParams(String),

    #[error("No turn is awaiting feedback")]
    NoPendingTurn,

    #[error("Feedback for {got_item} ({got_category}) does not match the item on display: {expected_item} ({expected_category})")]
    ItemMismatch {
        expected_item: String,
        expected_category: String,
        got_item: String,
        got_category: String,
    },

    #[error("Session already completed {0} turns")]
    SessionComplete(usize),
}

pub type Result<T> = std::result::Result<T, EngineError>;
