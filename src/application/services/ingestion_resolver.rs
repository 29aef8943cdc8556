use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;

use crate::application::ports::AudioFetcher;
use crate::domain::AudioSource;

use super::pipeline_error::IngestionError;
use super::temporary_resources::{TemporaryResource, TemporaryResourceManager};

/// Materializes an [`AudioSource`] into a temporary resource.
pub struct IngestionResolver {
    fetcher: Arc<dyn AudioFetcher>,
    resources: Arc<TemporaryResourceManager>,
}

impl IngestionResolver {
    pub fn new(fetcher: Arc<dyn AudioFetcher>, resources: Arc<TemporaryResourceManager>) -> Self {
        Self { fetcher, resources }
    }

    pub async fn resolve(
        &self,
        source: &AudioSource,
        resource: &TemporaryResource,
    ) -> Result<u64, IngestionError> {
        let written = match source {
            AudioSource::Remote { url } => self.fetch_remote(url, resource).await?,
            AudioSource::Upload {
                bytes,
                declared_len,
                ..
            } => self.copy_upload(bytes, *declared_len, resource).await?,
        };

        tracing::debug!(bytes = written, path = %resource.path(), "Audio materialized");
        Ok(written)
    }

    async fn fetch_remote(
        &self,
        url: &str,
        resource: &TemporaryResource,
    ) -> Result<u64, IngestionError> {
        if !is_http_locator(url) {
            return Err(IngestionError::InvalidUrl(
                "only http and https locators are supported".to_string(),
            ));
        }

        let remote = self
            .fetcher
            .open(url)
            .await
            .map_err(|e| IngestionError::Network(e.to_string()))?;

        if let Some(len) = remote.content_length {
            if len > self.resources.quota_bytes() {
                tracing::warn!(
                    content_length = len,
                    limit = self.resources.quota_bytes(),
                    "Remote audio larger than limit; aborting before download"
                );
                return Err(IngestionError::TooLarge {
                    limit_bytes: self.resources.quota_bytes(),
                });
            }
        }

        self.resources.write(resource, remote.body).await
    }

    async fn copy_upload(
        &self,
        bytes: &Bytes,
        declared_len: u64,
        resource: &TemporaryResource,
    ) -> Result<u64, IngestionError> {
        if bytes.is_empty() {
            return Err(IngestionError::UploadMalformed("empty upload".to_string()));
        }

        let received = bytes.len() as u64;
        if received != declared_len {
            return Err(IngestionError::UploadMalformed(format!(
                "declared {} bytes but received {}",
                declared_len, received
            )));
        }

        let payload = bytes.clone();
        let stream = futures::stream::once(async move { Ok(payload) }).boxed();
        self.resources.write(resource, stream).await
    }
}

fn is_http_locator(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    rest.is_some_and(|r| !r.is_empty() && !r.starts_with('/'))
}
