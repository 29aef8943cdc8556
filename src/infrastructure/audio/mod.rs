mod azure_whisper_engine;
mod openai_whisper_engine;
mod timestamp_aligner;
mod whisper_api;
mod whisper_http_backend;

pub use azure_whisper_engine::{AzureWhisperEngine, DEFAULT_AZURE_API_VERSION};
pub use openai_whisper_engine::{DEFAULT_OPENAI_BASE_URL, OpenAiWhisperEngine};
pub use timestamp_aligner::TimestampAligner;
pub use whisper_api::{DEFAULT_LANGUAGE, VerboseTranscription, normalize_language};
pub use whisper_http_backend::{
    DEFAULT_WHISPER_MODEL, WhisperBackendConfig, WhisperHttpBackend, WhisperProvider,
};
