use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::{InvocationId, StoragePath};

use super::pipeline_error::{IngestionError, ResourceError};

/// Ephemeral scratch object owned by exactly one invocation.
///
/// Release happens at most once: explicitly through [`TemporaryResourceManager::release`],
/// or from `Drop` when the owning future is cancelled or unwinds before releasing.
pub struct TemporaryResource {
    invocation_id: InvocationId,
    path: StoragePath,
    local_path: Option<PathBuf>,
    size_hint: Option<u64>,
    released: AtomicBool,
    store: Arc<dyn StagingStore>,
}

impl TemporaryResource {
    pub fn invocation_id(&self) -> InvocationId {
        self.invocation_id
    }

    pub fn path(&self) -> &StoragePath {
        &self.path
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    pub fn size_hint(&self) -> Option<u64> {
        self.size_hint
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    async fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            tracing::trace!(path = %self.path, "Temporary resource already released");
            return;
        }

        match self.store.delete(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path, "Temporary resource released"),
            Err(e) => {
                let error = ResourceError::CleanupFailed(e.to_string());
                tracing::warn!(error = %error, path = %self.path, "Failed to release temporary resource");
            }
        }
    }
}

impl Drop for TemporaryResource {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        let store = Arc::clone(&self.store);
        let path = self.path.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(path = %path, "Releasing abandoned temporary resource");
                handle.spawn(async move {
                    if let Err(e) = store.delete(&path).await {
                        let error = ResourceError::CleanupFailed(e.to_string());
                        tracing::warn!(error = %error, path = %path, "Failed to release abandoned temporary resource");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(path = %path, "No runtime available to release temporary resource");
            }
        }
    }
}

pub struct TemporaryResourceManager {
    store: Arc<dyn StagingStore>,
    quota_bytes: u64,
}

impl TemporaryResourceManager {
    pub fn new(store: Arc<dyn StagingStore>, quota_bytes: u64) -> Self {
        Self { store, quota_bytes }
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    /// Reserves a scratch location. Nothing is written until [`Self::write`].
    pub fn acquire(
        &self,
        invocation_id: InvocationId,
        name_hint: Option<&str>,
        size_hint: Option<u64>,
    ) -> TemporaryResource {
        let path = StoragePath::for_audio(&invocation_id, name_hint);
        let local_path = self.store.local_path(&path);
        tracing::debug!(path = %path, size_hint = ?size_hint, "Temporary resource acquired");

        TemporaryResource {
            invocation_id,
            path,
            local_path,
            size_hint,
            released: AtomicBool::new(false),
            store: Arc::clone(&self.store),
        }
    }

    /// Streams bytes into the resource, enforcing the byte quota. A stream that
    /// crosses the quota is aborted and its partial bytes discarded.
    pub async fn write(
        &self,
        resource: &TemporaryResource,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<u64, IngestionError> {
        if let Some(hint) = resource.size_hint {
            if hint > self.quota_bytes {
                return Err(IngestionError::TooLarge {
                    limit_bytes: self.quota_bytes,
                });
            }
        }

        let limited = enforce_quota(stream, self.quota_bytes);
        self.store
            .store(&resource.path, limited, resource.size_hint)
            .await
            .map_err(|e| self.map_store_error(e))
    }

    /// Idempotent and infallible; cleanup failures are logged.
    pub async fn release(&self, resource: &TemporaryResource) {
        resource.release().await;
    }

    fn map_store_error(&self, error: StagingStoreError) -> IngestionError {
        match error {
            StagingStoreError::Source(e) if is_quota_error(&e) => IngestionError::TooLarge {
                limit_bytes: self.quota_bytes,
            },
            StagingStoreError::Source(e) => IngestionError::Network(e.to_string()),
            StagingStoreError::Unavailable(msg)
            | StagingStoreError::WriteFailed(msg)
            | StagingStoreError::DeleteFailed(msg) => IngestionError::Storage(msg),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("payload exceeds {limit_bytes} bytes")]
struct QuotaExceeded {
    limit_bytes: u64,
}

fn is_quota_error(error: &io::Error) -> bool {
    error
        .get_ref()
        .is_some_and(|inner| inner.is::<QuotaExceeded>())
}

fn enforce_quota<'a>(
    stream: BoxStream<'a, Result<Bytes, io::Error>>,
    limit_bytes: u64,
) -> BoxStream<'a, Result<Bytes, io::Error>> {
    stream
        .scan(0u64, move |seen, chunk| {
            let item = chunk.and_then(|bytes| {
                *seen += bytes.len() as u64;
                if *seen > limit_bytes {
                    Err(io::Error::other(QuotaExceeded { limit_bytes }))
                } else {
                    Ok(bytes)
                }
            });
            futures::future::ready(Some(item))
        })
        .boxed()
}
