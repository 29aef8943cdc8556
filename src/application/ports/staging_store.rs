use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::domain::StoragePath;

/// Scratch byte storage backing temporary resources.
#[async_trait::async_trait]
pub trait StagingStore: Send + Sync {
    /// Copies the stream into `path`, returning the number of bytes stored. A stream
    /// error aborts the write and leaves nothing behind.
    async fn store(
        &self,
        path: &StoragePath,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
        content_length: Option<u64>,
    ) -> Result<u64, StagingStoreError>;

    /// Removes the object. Deleting an object that was never written succeeds.
    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError>;

    /// Filesystem location of the object, for tools that need to open it by path.
    fn local_path(&self, path: &StoragePath) -> Option<PathBuf>;
}

#[derive(Debug, thiserror::Error)]
pub enum StagingStoreError {
    #[error("scratch root unavailable: {0}")]
    Unavailable(String),
    #[error("scratch write failed: {0}")]
    WriteFailed(String),
    #[error("scratch delete failed: {0}")]
    DeleteFailed(String),
    #[error("source stream failed: {0}")]
    Source(#[from] io::Error),
}
