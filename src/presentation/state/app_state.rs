use std::sync::Arc;

use crate::application::services::TranscriptionPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranscriptionPipeline>,
    /// Largest audio payload accepted, in bytes. Sizes the request body limit.
    pub max_audio_bytes: u64,
}

impl AppState {
    pub fn new(pipeline: Arc<TranscriptionPipeline>, max_audio_bytes: u64) -> Self {
        Self {
            pipeline,
            max_audio_bytes,
        }
    }
}
