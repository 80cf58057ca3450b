/// In-process registry of live preference sessions
///
/// Each session sits behind its own async mutex, so turns of one session are
/// serialized while different users proceed in parallel. Sessions are never
/// shared or merged; the map only hands out the per-session lock.
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use preference_engine::{AlgorithmParams, SessionController};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::QuizConfig;
use crate::error::{AppError, Result};

pub struct PreferenceSession {
    pub preference_id: Uuid,
    pub access_id: String,
    /// Access token the client must echo in the `AI-ID` header
    pub ai_id: String,
    pub created_at: DateTime<Utc>,
    pub controller: SessionController,
}

impl std::fmt::Debug for PreferenceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceSession")
            .field("preference_id", &self.preference_id)
            .field("access_id", &self.access_id)
            .field("ai_id", &self.ai_id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl PreferenceSession {
    pub fn segment(&self) -> &str {
        self.controller.segment()
    }

    /// Feedback events recorded so far
    pub fn current_iteration(&self) -> usize {
        self.controller.completed_turns()
    }

    pub fn is_completed(&self) -> bool {
        self.controller.is_complete()
    }
}

pub type SessionHandle = Arc<Mutex<PreferenceSession>>;

pub struct SessionStore {
    sessions: DashMap<Uuid, SessionHandle>,
    params: AlgorithmParams,
    quiz: QuizConfig,
    fixed_seed: Option<u64>,
}

/// `AI_{access_id}_{8 hex chars}`
pub fn generate_ai_id(access_id: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("AI_{}_{}", access_id, &suffix[..8])
}

impl SessionStore {
    pub fn new(params: AlgorithmParams, quiz: QuizConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            params,
            quiz,
            fixed_seed: None,
        }
    }

    /// Seed every new session identically (tests, replays)
    pub fn with_fixed_seed(mut self, seed: u64) -> Self {
        self.fixed_seed = Some(seed);
        self
    }

    pub fn quiz(&self) -> &QuizConfig {
        &self.quiz
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Start a new session and return `(preference_id, ai_id)`.
    pub fn create(&self, access_id: &str, segment: &str) -> Result<(Uuid, String)> {
        if access_id.trim().is_empty() || !self.quiz.is_allowed_segment(segment) {
            return Err(AppError::BadRequest("Invalid parameters".to_string()));
        }

        let mut settings = self.quiz.session_settings();
        if let Some(seed) = self.fixed_seed {
            settings = settings.with_seed(seed);
        }

        let preference_id = Uuid::new_v4();
        let ai_id = generate_ai_id(access_id);
        let session = PreferenceSession {
            preference_id,
            access_id: access_id.to_string(),
            ai_id: ai_id.clone(),
            created_at: Utc::now(),
            controller: SessionController::new(segment, self.params, settings),
        };

        self.sessions
            .insert(preference_id, Arc::new(Mutex::new(session)));

        info!(
            preference_id = %preference_id,
            access_id = access_id,
            segment = segment,
            "Preference created"
        );

        Ok((preference_id, ai_id))
    }

    pub fn get(&self, preference_id: Uuid) -> Option<SessionHandle> {
        self.sessions
            .get(&preference_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a session and check the caller's access token.
    pub async fn authorize(&self, preference_id: Uuid, ai_id: Option<&str>) -> Result<SessionHandle> {
        let handle = self
            .get(preference_id)
            .ok_or_else(|| AppError::NotFound("Preference not found".to_string()))?;

        let expected = handle.lock().await.ai_id.clone();
        if ai_id != Some(expected.as_str()) {
            warn!(preference_id = %preference_id, "Rejected request with invalid AI-ID");
            return Err(AppError::Unauthorized("Invalid AI ID".to_string()));
        }

        Ok(handle)
    }

    pub fn remove(&self, preference_id: Uuid) -> Option<SessionHandle> {
        self.sessions.remove(&preference_id).map(|(_, handle)| handle)
    }

    /// Drop sessions created before `cutoff`. Sessions locked by an
    /// in-flight request are kept until the next sweep.
    pub fn evict_created_before(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.created_at >= cutoff,
            Err(_) => true,
        });
        let evicted = before.saturating_sub(self.sessions.len());

        if evicted > 0 {
            info!(evicted = evicted, live = self.sessions.len(), "Evicted expired sessions");
        } else {
            debug!(live = self.sessions.len(), "No expired sessions");
        }
        evicted
    }

    /// Drop sessions older than the configured TTL
    pub fn evict_expired(&self) -> usize {
        let secs = i64::try_from(self.quiz.session_ttl_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1_000);
        let ttl = Duration::seconds(secs);
        let cutoff = Utc::now()
            .checked_sub_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.evict_created_before(cutoff)
    }
}
