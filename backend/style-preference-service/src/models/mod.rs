/// Request and response bodies for the preference API
use preference_engine::{RankedCategory, SelectionHistoryEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePreferenceRequest {
    pub access_id: String,
    /// Older clients send this as `gender`
    #[serde(alias = "gender")]
    pub segment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePreferenceResponse {
    pub preference_id: Uuid,
    pub ai_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextImageResponse {
    pub image_url: String,
    /// 1-based iteration the client must answer next
    pub iteration: usize,
    pub style: String,
    pub image_key: String,
}

/// Missing fields deserialize empty and are rejected by validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IterationRequest {
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub image_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationResponse {
    pub iteration: usize,
    pub completed: bool,
    pub score_change: f64,
    pub current_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleScore {
    pub style: String,
    pub score: f64,
}

impl From<RankedCategory> for StyleScore {
    fn from(ranked: RankedCategory) -> Self {
        Self {
            style: ranked.category,
            score: ranked.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub top_styles: Vec<StyleScore>,
    pub selection_history: Vec<SelectionHistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
