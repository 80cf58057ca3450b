/// Quiz orchestration
///
/// Glues the session store, item catalog and profile store together for the
/// HTTP layer. All engine calls for one preference happen while holding that
/// session's lock, so a turn is served and answered atomically.
use chrono::Utc;
use preference_engine::{FeedbackKind, TurnOutcome};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CreatePreferenceResponse, IterationRequest, IterationResponse, MessageResponse,
    NextImageResponse, ProfileResponse,
};
use crate::services::catalog::ItemCatalog;
use crate::services::profiles::{PreferenceProfile, ProfileStore};
use crate::services::store::SessionStore;

pub struct QuizService {
    store: SessionStore,
    catalog: Arc<dyn ItemCatalog>,
    profiles: Arc<dyn ProfileStore>,
}

/// Only the two recognised feedback words are accepted over HTTP
fn parse_feedback(raw: &str) -> Result<FeedbackKind> {
    match raw {
        "like" => Ok(FeedbackKind::Like),
        "dislike" => Ok(FeedbackKind::Dislike),
        _ => Err(AppError::BadRequest("Invalid parameters".to_string())),
    }
}

impl QuizService {
    pub fn new(
        store: SessionStore,
        catalog: Arc<dyn ItemCatalog>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            store,
            catalog,
            profiles,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn create_preference(&self, access_id: &str, segment: &str) -> Result<CreatePreferenceResponse> {
        let (preference_id, ai_id) = self.store.create(access_id, segment)?;
        Ok(CreatePreferenceResponse {
            preference_id,
            ai_id,
        })
    }

    pub async fn next_image(&self, preference_id: Uuid, ai_id: Option<&str>) -> Result<NextImageResponse> {
        let handle = self.store.authorize(preference_id, ai_id).await?;
        let mut session = handle.lock().await;

        if session.controller.is_exhausted() {
            return Err(AppError::BadRequest("No more images available".to_string()));
        }
        if session.is_completed() {
            return Err(AppError::BadRequest("Quiz completed".to_string()));
        }

        let pool = self.catalog.list_available_items(session.segment()).await?;

        let selection = match session.controller.next_turn(&pool) {
            TurnOutcome::Selected(selection) => selection,
            TurnOutcome::NoMoreItems => {
                info!(
                    preference_id = %preference_id,
                    completed = session.current_iteration(),
                    "Catalog exhausted, preference marked completed"
                );
                return Err(AppError::BadRequest("No more images available".to_string()));
            }
        };

        let image_url = self.catalog.resolve_display_handle(&selection.item).await?;

        Ok(NextImageResponse {
            image_url,
            iteration: selection.turn,
            style: selection.category,
            image_key: selection.item,
        })
    }

    pub async fn submit_iteration(
        &self,
        preference_id: Uuid,
        iteration: usize,
        ai_id: Option<&str>,
        req: &IterationRequest,
    ) -> Result<IterationResponse> {
        if req.style.is_empty() || req.image_key.is_empty() {
            return Err(AppError::BadRequest("Invalid parameters".to_string()));
        }
        let feedback = parse_feedback(&req.feedback)?;

        let handle = self.store.authorize(preference_id, ai_id).await?;
        let mut session = handle.lock().await;

        let expected = session.current_iteration() + 1;
        if iteration != expected {
            warn!(
                preference_id = %preference_id,
                iteration = iteration,
                expected = expected,
                "Out of order iteration"
            );
            return Err(AppError::BadRequest("Invalid iteration ID".to_string()));
        }

        let outcome = session
            .controller
            .submit_feedback(&req.image_key, &req.style, feedback)?;

        Ok(IterationResponse {
            iteration,
            completed: session.is_completed(),
            score_change: outcome.score_delta,
            current_score: outcome.resulting_score,
        })
    }

    pub async fn save_profile(&self, preference_id: Uuid, ai_id: Option<&str>) -> Result<MessageResponse> {
        let handle = self.store.authorize(preference_id, ai_id).await?;
        let session = handle.lock().await;

        if !session.is_completed() {
            return Err(AppError::BadRequest("Profile not completed".to_string()));
        }

        let summary = session.controller.finalize();
        let profile = PreferenceProfile {
            preference_id,
            access_id: session.access_id.clone(),
            ai_id: session.ai_id.clone(),
            segment: session.segment().to_string(),
            top_styles: summary.ranked_top_categories,
            selection_history: summary.history,
            saved_at: Utc::now(),
        };
        self.profiles.save(&profile).await?;

        // The profile is the durable record from here on
        drop(session);
        self.store.remove(preference_id);

        info!(
            preference_id = %preference_id,
            top = ?profile.top_styles.first().map(|s| s.category.as_str()),
            live_sessions = self.store.len(),
            "Profile saved, session released"
        );

        Ok(MessageResponse {
            message: "Profile saved successfully".to_string(),
        })
    }

    /// Reads are checked against the live session while the quiz runs and
    /// against the token stored with the profile once it has been saved.
    pub async fn get_profile(&self, preference_id: Uuid, ai_id: Option<&str>) -> Result<ProfileResponse> {
        let live = self.store.get(preference_id).is_some();
        if live {
            self.store.authorize(preference_id, ai_id).await?;
        }

        let profile = match self.profiles.get(preference_id).await? {
            Some(profile) => profile,
            None if live => return Err(AppError::NotFound("Profile not found".to_string())),
            None => return Err(AppError::NotFound("Preference not found".to_string())),
        };

        if !live && ai_id != Some(profile.ai_id.as_str()) {
            warn!(preference_id = %preference_id, "Rejected profile read with invalid AI-ID");
            return Err(AppError::Unauthorized("Invalid AI ID".to_string()));
        }

        Ok(ProfileResponse {
            top_styles: profile.top_styles.into_iter().map(Into::into).collect(),
            selection_history: profile.selection_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuizConfig;
    use crate::services::catalog::{CatalogError, MockItemCatalog};
    use crate::services::profiles::InMemoryProfileStore;
    use preference_engine::{AlgorithmParams, ItemPool};

    fn quiz_config(max_turns: usize) -> QuizConfig {
        QuizConfig {
            max_turns,
            mandatory_styles: vec!["classic".to_string(), "street".to_string()],
            allowed_segments: vec!["women".to_string()],
            ..QuizConfig::default()
        }
    }

    fn small_pool() -> ItemPool {
        let mut pool = ItemPool::new();
        pool.insert("classic".to_string(), vec!["c1".to_string(), "c2".to_string()]);
        pool.insert("street".to_string(), vec!["s1".to_string()]);
        pool
    }

    fn service(catalog: MockItemCatalog, max_turns: usize) -> QuizService {
        let store = SessionStore::new(AlgorithmParams::reference(), quiz_config(max_turns))
            .with_fixed_seed(7);
        QuizService::new(store, Arc::new(catalog), Arc::new(InMemoryProfileStore::new()))
    }

    fn working_catalog() -> MockItemCatalog {
        let mut catalog = MockItemCatalog::new();
        catalog
            .expect_list_available_items()
            .returning(|_| Ok(small_pool()));
        catalog
            .expect_resolve_display_handle()
            .returning(|item| Ok(format!("https://img/{item}")));
        catalog
    }

    fn answer(next: &NextImageResponse, feedback: &str) -> IterationRequest {
        IterationRequest {
            feedback: feedback.to_string(),
            style: next.style.clone(),
            image_key: next.image_key.clone(),
        }
    }

    #[test]
    fn test_parse_feedback_is_strict() {
        assert_eq!(parse_feedback("like").unwrap(), FeedbackKind::Like);
        assert_eq!(parse_feedback("dislike").unwrap(), FeedbackKind::Dislike);
        assert!(parse_feedback("LIKE").is_err());
        assert!(parse_feedback("meh").is_err());
    }

    #[tokio::test]
    async fn test_catalog_failure_maps_to_bad_gateway() {
        let mut catalog = MockItemCatalog::new();
        catalog
            .expect_list_available_items()
            .returning(|_| Err(CatalogError::Storage("bucket offline".to_string())));
        let quiz = service(catalog, 30);

        let created = quiz.create_preference("alice", "women").unwrap();
        let err = quiz
            .next_image(created.preference_id, Some(&created.ai_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_turn_limit_completes_quiz() {
        let quiz = service(working_catalog(), 2);
        let created = quiz.create_preference("alice", "women").unwrap();
        let (id, ai) = (created.preference_id, Some(created.ai_id.as_str()));

        for n in 1..=2 {
            let next = quiz.next_image(id, ai).await.unwrap();
            assert_eq!(next.iteration, n);
            assert!(next.image_url.starts_with("https://img/"));
            let resp = quiz.submit_iteration(id, n, ai, &answer(&next, "like")).await.unwrap();
            assert_eq!(resp.completed, n == 2);
        }

        let err = quiz.next_image(id, ai).await.unwrap_err();
        assert_eq!(err.to_string(), "Quiz completed");

        quiz.save_profile(id, ai).await.unwrap();
        let profile = quiz.get_profile(id, ai).await.unwrap();
        assert_eq!(profile.selection_history.len(), 2);
        assert!(!profile.top_styles.is_empty());
    }

    async fn finish(quiz: &QuizService, access_id: &str) -> (Uuid, String) {
        let created = quiz.create_preference(access_id, "women").unwrap();
        let (id, ai) = (created.preference_id, Some(created.ai_id.as_str()));
        for n in 1..=2 {
            let next = quiz.next_image(id, ai).await.unwrap();
            quiz.submit_iteration(id, n, ai, &answer(&next, "like"))
                .await
                .unwrap();
        }
        quiz.save_profile(id, ai).await.unwrap();
        (id, created.ai_id)
    }

    #[tokio::test]
    async fn test_saved_profiles_release_sessions() {
        let quiz = service(working_catalog(), 2);

        let mut finished = Vec::new();
        for i in 0..50 {
            finished.push(finish(&quiz, &format!("user{i}")).await);
        }
        assert!(quiz.store().is_empty());

        // Profiles stay readable with their original token
        let (id, ai_id) = &finished[7];
        let profile = quiz.get_profile(*id, Some(ai_id)).await.unwrap();
        assert_eq!(profile.selection_history.len(), 2);

        let err = quiz.get_profile(*id, Some("AI_user7_ffffffff")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = quiz.next_image(*id, Some(ai_id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = quiz.get_profile(Uuid::new_v4(), Some(ai_id)).await.unwrap_err();
        assert_eq!(err.to_string(), "Preference not found");
    }

    #[tokio::test]
    async fn test_exhaustion_completes_quiz() {
        let quiz = service(working_catalog(), 30);
        let created = quiz.create_preference("alice", "women").unwrap();
        let (id, ai) = (created.preference_id, Some(created.ai_id.as_str()));

        for n in 1..=3 {
            let next = quiz.next_image(id, ai).await.unwrap();
            quiz.submit_iteration(id, n, ai, &answer(&next, "dislike"))
                .await
                .unwrap();
        }

        let err = quiz.next_image(id, ai).await.unwrap_err();
        assert_eq!(err.to_string(), "No more images available");
        assert!(quiz.store().get(id).unwrap().lock().await.is_completed());

        // Saving is allowed once the catalog ran dry
        quiz.save_profile(id, ai).await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_order_iteration_rejected() {
        let quiz = service(working_catalog(), 30);
        let created = quiz.create_preference("alice", "women").unwrap();
        let (id, ai) = (created.preference_id, Some(created.ai_id.as_str()));

        let next = quiz.next_image(id, ai).await.unwrap();
        let err = quiz
            .submit_iteration(id, 2, ai, &answer(&next, "like"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid iteration ID");

        // Feedback for an item that is not on display
        let mut wrong = answer(&next, "like");
        wrong.image_key = "not-shown".to_string();
        assert!(quiz.submit_iteration(id, 1, ai, &wrong).await.is_err());
    }

    #[tokio::test]
    async fn test_save_before_completion_rejected() {
        let quiz = service(working_catalog(), 30);
        let created = quiz.create_preference("alice", "women").unwrap();
        let err = quiz
            .save_profile(created.preference_id, Some(&created.ai_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
