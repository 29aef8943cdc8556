use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{Aligner, EngineError, SpeechBackend, Transcriber};
use crate::domain::{DeviceKind, ModelSize};

use super::azure_whisper_engine::{AzureWhisperEngine, DEFAULT_AZURE_API_VERSION};
use super::openai_whisper_engine::OpenAiWhisperEngine;
use super::timestamp_aligner::TimestampAligner;

pub const DEFAULT_WHISPER_MODEL: &str = "whisper-1";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WhisperProvider {
    OpenAi,
    Azure,
}

#[derive(Debug, Clone)]
pub struct WhisperBackendConfig {
    pub provider: WhisperProvider,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub azure_api_version: Option<String>,
    /// Provider model id (or Azure deployment) for sizes missing from `model_map`.
    pub default_model: String,
    pub model_map: HashMap<String, String>,
    pub word_timestamps: bool,
    pub verify_models: bool,
    pub request_timeout: Duration,
}

impl WhisperBackendConfig {
    pub fn model_for(&self, model_size: &ModelSize) -> &str {
        self.model_map
            .get(model_size.as_str())
            .map(String::as_str)
            .unwrap_or(&self.default_model)
    }
}

/// Speech backend over the hosted Whisper transcription API. Alignment runs locally
/// on the returned timestamps, so the device only matters for logging here.
pub struct WhisperHttpBackend {
    client: reqwest::Client,
    config: WhisperBackendConfig,
}

impl WhisperHttpBackend {
    pub fn new(config: WhisperBackendConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| EngineError::ModelLoadFailed(format!("http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, EngineError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                EngineError::ModelLoadFailed("API key required for Whisper API".to_string())
            })
    }
}

#[async_trait]
impl SpeechBackend for WhisperHttpBackend {
    async fn load_transcriber(
        &self,
        model_size: &ModelSize,
        device: DeviceKind,
    ) -> Result<Arc<dyn Transcriber>, EngineError> {
        let model = self.config.model_for(model_size).to_string();
        let api_key = self.api_key()?;
        tracing::debug!(
            provider = ?self.config.provider,
            model_size = %model_size,
            model = %model,
            device = %device,
            "Preparing Whisper transcriber"
        );

        match self.config.provider {
            WhisperProvider::OpenAi => {
                let engine = OpenAiWhisperEngine::new(
                    self.client.clone(),
                    api_key.to_string(),
                    self.config.base_url.clone(),
                    model,
                    self.config.word_timestamps,
                );
                if self.config.verify_models {
                    engine.verify_model().await?;
                }
                Ok(Arc::new(engine))
            }
            WhisperProvider::Azure => {
                let base_url = self.config.base_url.as_deref().ok_or_else(|| {
                    EngineError::ModelLoadFailed("base_url required for Azure Whisper".to_string())
                })?;
                let api_version = self
                    .config
                    .azure_api_version
                    .as_deref()
                    .unwrap_or(DEFAULT_AZURE_API_VERSION);
                let engine = AzureWhisperEngine::new(
                    self.client.clone(),
                    base_url,
                    &model,
                    api_key,
                    api_version,
                    self.config.word_timestamps,
                );
                Ok(Arc::new(engine))
            }
        }
    }

    async fn load_aligner(
        &self,
        language: &str,
        device: DeviceKind,
    ) -> Result<Arc<dyn Aligner>, EngineError> {
        tracing::debug!(language, device = %device, "Preparing timestamp aligner");
        Ok(Arc::new(TimestampAligner::new(language)))
    }
}
