/// S3-backed item catalog
///
/// Lists quiz images under `{prefix}{segment}/` and hands out presigned GET
/// URLs for display. Listing is paginated so buckets with more than 1000
/// objects per segment are fully covered.
use super::{group_keys, CatalogError, ItemCatalog, Result};
use crate::config::CatalogConfig;
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use preference_engine::ItemPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Clone)]
pub struct S3Catalog {
    client: Arc<Client>,
    bucket: String,
    prefix: String,
    presign_expiry: Duration,
}

impl S3Catalog {
    pub fn new(client: Arc<Client>, config: &CatalogConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
            presign_expiry: Duration::from_secs(config.presigned_url_expiration_secs),
        }
    }

    /// Build the AWS client from the default credential chain
    pub async fn connect(config: &CatalogConfig) -> Self {
        use aws_sdk_s3::config::Region;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self::new(Arc::new(Client::from_conf(s3_config)), config)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                error!(bucket = %self.bucket, prefix = prefix, "Failed to list objects: {}", e);
                CatalogError::Storage(e.to_string())
            })?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(|k| k.to_string())),
            );
        }

        Ok(keys)
    }
}

#[async_trait]
impl ItemCatalog for S3Catalog {
    async fn list_available_items(&self, segment: &str) -> Result<ItemPool> {
        let segment_prefix = format!("{}{}/", self.prefix, segment);
        let keys = self.list_keys(&segment_prefix).await?;
        let key_count = keys.len();

        let pool = group_keys(&self.prefix, keys)
            .remove(segment)
            .unwrap_or_default();

        debug!(
            segment = segment,
            keys = key_count,
            styles = pool.len(),
            "Listed catalog items"
        );

        Ok(pool)
    }

    async fn resolve_display_handle(&self, item: &str) -> Result<String> {
        let presigning = PresigningConfig::builder()
            .expires_in(self.presign_expiry)
            .build()
            .map_err(|e| CatalogError::Presign(format!("Failed to create presigning config: {e}")))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(item)
            .presigned(presigning)
            .await
            .map_err(|e| CatalogError::Presign(format!("Failed to presign {item}: {e}")))?;

        Ok(request.uri().to_string())
    }
}
