use axum::Json;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::application::services::TranscriptionRequest;
use crate::domain::AudioSource;
use crate::presentation::state::AppState;

use super::responses::{failure_response, outcome_response};
use super::upload_form::UploadForm;

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    #[serde(alias = "url")]
    pub audio_url: String,
    pub language: Option<String>,
    pub model_size: Option<String>,
}

#[tracing::instrument(skip(state, request))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    Json(request): Json<TranscribeRequest>,
) -> impl IntoResponse {
    let request = TranscriptionRequest {
        source: AudioSource::remote(request.audio_url),
        language: request.language,
        model_size: request.model_size,
    };
    run_pipeline(&state, request).await
}

#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_file_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> impl IntoResponse {
    let parts = UploadForm::read(multipart, state.max_audio_bytes)
        .await
        .and_then(UploadForm::into_source);
    let (source, language, model_size) = match parts {
        Ok(parts) => parts,
        Err(e) => return failure_response(&e),
    };

    let request = TranscriptionRequest {
        source,
        language,
        model_size,
    };
    run_pipeline(&state, request).await
}

async fn run_pipeline(state: &AppState, request: TranscriptionRequest) -> Response {
    match state.pipeline.run(request).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => failure_response(&e),
    }
}
