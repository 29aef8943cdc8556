use std::path::Path;

use async_trait::async_trait;

use crate::application::ports::{EngineError, RawTranscription, Transcriber};

use super::whisper_api::{read_transcription, transcription_form};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    word_timestamps: bool,
}

impl OpenAiWhisperEngine {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        base_url: Option<String>,
        model: String,
        word_timestamps: bool,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model,
            word_timestamps,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Confirms the provider serves the model before it is cached.
    pub async fn verify_model(&self) -> Result<(), EngineError> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| EngineError::ModelLoadFailed(format!("request: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::ModelLoadFailed(format!(
                "model {} unavailable: status {}",
                self.model, status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Transcriber for OpenAiWhisperEngine {
    async fn transcribe(
        &self,
        audio: &Path,
        language_hint: Option<&str>,
    ) -> Result<RawTranscription, EngineError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let form = transcription_form(audio, self.word_timestamps, language_hint)
            .await?
            .text("model", self.model.clone());

        tracing::debug!(model = %self.model, "Sending audio to OpenAI Whisper API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EngineError::InferenceFailed(format!("request: {}", e.without_url())))?;

        let raw = read_transcription(response, language_hint).await?;

        tracing::info!(
            segments = raw.segments.len(),
            language = %raw.language,
            "OpenAI Whisper transcription completed"
        );

        Ok(raw)
    }
}
