use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// An opened remote body, not yet consumed.
pub struct RemoteAudio {
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, io::Error>>,
}

#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn open(&self, url: &str) -> Result<RemoteAudio, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}
