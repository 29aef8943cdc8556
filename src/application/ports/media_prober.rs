use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ProbeResult;

#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ProbeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("inspection tool unavailable: {0}")]
    ToolUnavailable(String),
    #[error("inspection tool failed: {0}")]
    ToolFailed(String),
    #[error("could not parse inspection output: {0}")]
    ParseFailure(String),
    #[error("no audio stream found")]
    NoAudioStream,
    #[error("inspection timed out after {0:?}")]
    Timeout(Duration),
}
