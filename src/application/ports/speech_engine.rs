use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DeviceKind, ModelSize, TranscriptSegment};

/// Coarse engine output before alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTranscription {
    pub segments: Vec<TranscriptSegment>,
    pub language: String,
    pub duration_sec: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTranscript {
    pub segments: Vec<TranscriptSegment>,
    pub total_duration_sec: f64,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: &Path,
        language_hint: Option<&str>,
    ) -> Result<RawTranscription, EngineError>;
}

#[async_trait]
pub trait Aligner: Send + Sync {
    async fn align(
        &self,
        raw: &RawTranscription,
        audio: &Path,
    ) -> Result<AlignedTranscript, EngineError>;
}

/// Loads model handles. Handles are cached by the caller and shared across invocations.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn load_transcriber(
        &self,
        model_size: &ModelSize,
        device: DeviceKind,
    ) -> Result<Arc<dyn Transcriber>, EngineError>;

    async fn load_aligner(
        &self,
        language: &str,
        device: DeviceKind,
    ) -> Result<Arc<dyn Aligner>, EngineError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::ModelLoadFailed(_) => "model_load_failed",
            EngineError::InferenceFailed(_) => "inference_failed",
            EngineError::DeviceUnavailable(_) => "device_unavailable",
            EngineError::Timeout(_) => "timeout",
        }
    }
}
