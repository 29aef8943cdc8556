use std::path::Path;

use async_trait::async_trait;

use crate::application::ports::{EngineError, RawTranscription, Transcriber};

use super::whisper_api::{read_transcription, transcription_form};

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

pub struct AzureWhisperEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    word_timestamps: bool,
}

impl AzureWhisperEngine {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        deployment: &str,
        api_key: &str,
        api_version: &str,
        word_timestamps: bool,
    ) -> Self {
        let endpoint = format!(
            "{}/openai/deployments/{}/audio/transcriptions?api-version={}",
            base_url.trim_end_matches('/'),
            deployment,
            api_version,
        );
        Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            word_timestamps,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transcriber for AzureWhisperEngine {
    async fn transcribe(
        &self,
        audio: &Path,
        language_hint: Option<&str>,
    ) -> Result<RawTranscription, EngineError> {
        let form = transcription_form(audio, self.word_timestamps, language_hint).await?;

        tracing::debug!(endpoint = %self.endpoint, "Sending audio to Azure OpenAI Whisper");

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EngineError::InferenceFailed(format!("request: {}", e.without_url())))?;

        let raw = read_transcription(response, language_hint).await?;

        tracing::info!(
            segments = raw.segments.len(),
            language = %raw.language,
            "Azure OpenAI Whisper transcription completed"
        );

        Ok(raw)
    }
}
