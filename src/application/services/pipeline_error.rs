use crate::application::ports::EngineError;
use crate::domain::FailedStage;

#[derive(Debug, Clone, thiserror::Error)]
pub enum IngestionError {
    #[error("audio exceeds the {limit_bytes} byte limit")]
    TooLarge { limit_bytes: u64 },
    #[error("network failure: {0}")]
    Network(String),
    #[error("malformed upload: {0}")]
    UploadMalformed(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("scratch storage: {0}")]
    Storage(String),
}

impl IngestionError {
    pub fn kind(&self) -> &'static str {
        match self {
            IngestionError::TooLarge { .. } => "too_large",
            IngestionError::Network(_) => "network",
            IngestionError::UploadMalformed(_) => "upload_malformed",
            IngestionError::InvalidUrl(_) => "invalid_url",
            IngestionError::Storage(_) => "storage",
        }
    }
}

/// Scratch cleanup failure. Logged where it happens, never returned to callers.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("cleanup failed: {0}")]
    CleanupFailed(String),
}

/// Terminal failure of one invocation, tagged with the stage it happened in.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("ingestion: {0}")]
    Ingest(IngestionError),
    #[error("transcription: {0}")]
    Transcribe(EngineError),
    #[error("alignment: {0}")]
    Align(EngineError),
}

impl PipelineError {
    pub fn stage(&self) -> FailedStage {
        match self {
            PipelineError::Ingest(_) => FailedStage::Ingest,
            PipelineError::Transcribe(_) => FailedStage::Transcribe,
            PipelineError::Align(_) => FailedStage::Align,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Ingest(e) => e.kind(),
            PipelineError::Transcribe(e) | PipelineError::Align(e) => e.kind(),
        }
    }
}
