/// Finished-quiz profile persistence
///
/// A profile is the serialized end state of one preference session: the
/// top styles and the full selection history. Sessions themselves are never
/// persisted; only this snapshot survives once the quiz is saved.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use preference_engine::{RankedCategory, SelectionHistoryEntry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("Profile I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Profile encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProfileStoreError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub preference_id: Uuid,
    pub access_id: String,
    /// Token checked on reads once the live session is gone
    pub ai_id: String,
    pub segment: String,
    pub top_styles: Vec<RankedCategory>,
    pub selection_history: Vec<SelectionHistoryEntry>,
    pub saved_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn save(&self, profile: &PreferenceProfile) -> Result<()>;
    async fn get(&self, preference_id: Uuid) -> Result<Option<PreferenceProfile>>;
}

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<Uuid, PreferenceProfile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn save(&self, profile: &PreferenceProfile) -> Result<()> {
        self.profiles.insert(profile.preference_id, profile.clone());
        Ok(())
    }

    async fn get(&self, preference_id: Uuid) -> Result<Option<PreferenceProfile>> {
        Ok(self.profiles.get(&preference_id).map(|p| p.value().clone()))
    }
}

/// One pretty-printed JSON file per profile: `{dir}/{preference_id}.json`
#[derive(Debug, Clone)]
pub struct JsonFileProfileStore {
    dir: PathBuf,
}

impl JsonFileProfileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!(dir = %dir.display(), "Profile store ready");
        Ok(Self { dir })
    }

    fn path_for(&self, preference_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", preference_id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ProfileStore for JsonFileProfileStore {
    async fn save(&self, profile: &PreferenceProfile) -> Result<()> {
        let path = self.path_for(profile.preference_id);
        let tmp = path.with_extension("json.tmp");

        let body = serde_json::to_vec_pretty(profile)?;
        tokio::fs::write(&tmp, body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp profile");
            }
            return Err(e.into());
        }

        debug!(path = %path.display(), "Profile written");
        Ok(())
    }

    async fn get(&self, preference_id: Uuid) -> Result<Option<PreferenceProfile>> {
        match tokio::fs::read(self.path_for(preference_id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
