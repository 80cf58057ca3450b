// ============================================
// Item Catalog
// ============================================
//
// Where quiz images come from. The engine only sees an ItemPool
// (style -> image keys); the catalog lists it per segment and turns an
// image key into something a browser can load.
//
// Object key layout:
//   {prefix}{segment}/{style}-style/{file}
//   e.g. Styles/women/classic-style/001.jpg -> segment "women", style "classic"

pub mod s3;

pub use s3::S3Catalog;

use async_trait::async_trait;
use preference_engine::ItemPool;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{CatalogBackend, CatalogConfig};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Presign error: {0}")]
    Presign(String),

    #[error("Invalid manifest: {0}")]
    Manifest(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Source of items and their display handles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Items for one segment grouped by style. Keys must stay stable for
    /// the lifetime of a session so the shown set stays meaningful.
    async fn list_available_items(&self, segment: &str) -> Result<ItemPool>;

    /// Opaque locator (e.g. presigned URL) for showing `item` to a user
    async fn resolve_display_handle(&self, item: &str) -> Result<String>;
}

const STYLE_SUFFIX: &str = "-style";

/// Split an object key into `(segment, style)`.
///
/// Returns `None` for keys outside `prefix` or without a file component.
pub fn parse_style_key<'a>(prefix: &str, key: &'a str) -> Option<(&'a str, &'a str)> {
    let rest = key.strip_prefix(prefix)?;
    let mut parts = rest.splitn(3, '/');

    let segment = parts.next().filter(|s| !s.is_empty())?;
    let style_dir = parts.next().filter(|s| !s.is_empty())?;
    parts.next().filter(|file| !file.is_empty() && !file.ends_with('/'))?;

    let style = style_dir.strip_suffix(STYLE_SUFFIX).unwrap_or(style_dir);
    Some((segment, style))
}

/// Group object keys into one item pool per segment
pub fn group_keys<I>(prefix: &str, keys: I) -> HashMap<String, ItemPool>
where
    I: IntoIterator<Item = String>,
{
    let mut by_segment: HashMap<String, ItemPool> = HashMap::new();

    for key in keys {
        let Some((segment, style)) = parse_style_key(prefix, &key) else {
            debug!(key = %key, "Skipping key outside style layout");
            continue;
        };
        let (segment, style) = (segment.to_string(), style.to_string());

        by_segment
            .entry(segment)
            .or_default()
            .entry(style)
            .or_default()
            .push(key);
    }

    by_segment
}

/// Build the catalog selected by `CATALOG_BACKEND`
pub async fn from_config(config: &CatalogConfig) -> Result<Arc<dyn ItemCatalog>> {
    match config.backend {
        CatalogBackend::S3 => {
            info!(bucket = %config.bucket, prefix = %config.prefix, "Using S3 catalog");
            Ok(Arc::new(S3Catalog::connect(config).await))
        }
        CatalogBackend::Memory => {
            let memory = match &config.manifest_path {
                Some(path) => InMemoryCatalog::from_manifest(&config.public_base_url, path).await?,
                None => {
                    warn!("Memory catalog without CATALOG_MANIFEST, quizzes will be empty");
                    InMemoryCatalog::new(&config.public_base_url)
                }
            };
            Ok(Arc::new(memory))
        }
    }
}

/// Item count per `(segment, style)`
pub async fn style_counts(
    catalog: &dyn ItemCatalog,
    segments: &[String],
) -> Result<BTreeMap<(String, String), usize>> {
    let mut counts = BTreeMap::new();
    for segment in segments {
        let pool = catalog.list_available_items(segment).await?;
        for (style, items) in pool {
            counts.insert((segment.clone(), style), items.len());
        }
    }
    Ok(counts)
}

/// Fixed in-memory catalog for local runs and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    segments: HashMap<String, ItemPool>,
    base_url: String,
}

impl InMemoryCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            segments: HashMap::new(),
            base_url: base_url.into(),
        }
    }

    pub fn with_segment(mut self, segment: impl Into<String>, pool: ItemPool) -> Self {
        self.segments.insert(segment.into(), pool);
        self
    }

    /// Build from a flat list of object keys
    pub fn from_keys<I>(base_url: impl Into<String>, prefix: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            segments: group_keys(prefix, keys),
            base_url: base_url.into(),
        }
    }

    /// Load `{segment: {style: [keys]}}` from a JSON file
    pub async fn from_manifest(base_url: impl Into<String>, path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Manifest(format!("{}: {}", path.display(), e)))?;
        let segments: HashMap<String, ItemPool> = serde_json::from_str(&raw)
            .map_err(|e| CatalogError::Manifest(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            segments = segments.len(),
            "Loaded catalog manifest"
        );

        Ok(Self {
            segments,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ItemCatalog for InMemoryCatalog {
    async fn list_available_items(&self, segment: &str) -> Result<ItemPool> {
        Ok(self.segments.get(segment).cloned().unwrap_or_default())
    }

    async fn resolve_display_handle(&self, item: &str) -> Result<String> {
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), item))
    }
}
