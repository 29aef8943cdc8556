use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{MultipartUpload, ObjectStore, PutPayload};

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::StoragePath;

/// Scratch store on the local filesystem under a single root directory.
pub struct LocalStagingStore {
    fs: Arc<LocalFileSystem>,
    root: PathBuf,
}

impl LocalStagingStore {
    /// Creates the root if missing. The root is canonicalized so external tools get
    /// absolute paths.
    pub fn new(root: PathBuf) -> Result<Self, StagingStoreError> {
        let unavailable = |e: io::Error| StagingStoreError::Unavailable(e.to_string());
        std::fs::create_dir_all(&root).map_err(unavailable)?;
        let root = std::fs::canonicalize(&root).map_err(unavailable)?;
        let fs = LocalFileSystem::new_with_prefix(&root)
            .map_err(|e| StagingStoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            fs: Arc::new(fs),
            root,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.root
    }
}

async fn copy_parts(
    upload: &mut Box<dyn MultipartUpload>,
    mut stream: BoxStream<'_, Result<Bytes, io::Error>>,
) -> Result<u64, StagingStoreError> {
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        upload
            .put_part(PutPayload::from(chunk))
            .await
            .map_err(|e| StagingStoreError::WriteFailed(e.to_string()))?;
    }
    Ok(written)
}

#[async_trait::async_trait]
impl StagingStore for LocalStagingStore {
    async fn store(
        &self,
        path: &StoragePath,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
        content_length: Option<u64>,
    ) -> Result<u64, StagingStoreError> {
        let location = ObjectPath::from(path.as_str());
        let mut upload = self
            .fs
            .put_multipart(&location)
            .await
            .map_err(|e| StagingStoreError::WriteFailed(e.to_string()))?;

        let written = match copy_parts(&mut upload, stream).await {
            Ok(n) => n,
            Err(e) => {
                if let Err(abort) = upload.abort().await {
                    tracing::debug!(path = %path, error = %abort, "Abort of partial write failed");
                }
                return Err(e);
            }
        };
        upload
            .complete()
            .await
            .map_err(|e| StagingStoreError::WriteFailed(e.to_string()))?;

        if content_length.is_some_and(|announced| announced != written) {
            tracing::debug!(
                path = %path,
                announced = ?content_length,
                written,
                "Stored byte count differs from announced length"
            );
        }
        Ok(written)
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError> {
        match self.fs.delete(&ObjectPath::from(path.as_str())).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(StagingStoreError::DeleteFailed(e.to_string())),
        }
    }

    fn local_path(&self, path: &StoragePath) -> Option<PathBuf> {
        Some(self.root.join(path.as_str()))
    }
}
