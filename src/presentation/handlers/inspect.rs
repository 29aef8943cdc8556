use axum::Json;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::domain::AudioSource;
use crate::presentation::state::AppState;

use super::responses::{failure_response, inspection_response};
use super::upload_form::UploadForm;

#[derive(Debug, Deserialize)]
pub struct InspectRequest {
    #[serde(alias = "url")]
    pub audio_url: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn inspect_handler(
    State(state): State<AppState>,
    Json(request): Json<InspectRequest>,
) -> impl IntoResponse {
    inspect(&state, AudioSource::remote(request.audio_url)).await
}

#[tracing::instrument(skip(state, multipart))]
pub async fn inspect_file_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> impl IntoResponse {
    let parts = UploadForm::read(multipart, state.max_audio_bytes)
        .await
        .and_then(UploadForm::into_source);
    match parts {
        Ok((source, _, _)) => inspect(&state, source).await,
        Err(e) => failure_response(&e),
    }
}

async fn inspect(state: &AppState, source: AudioSource) -> Response {
    match state.pipeline.inspect(source).await {
        Ok(inspection) => inspection_response(inspection),
        Err(e) => failure_response(&e),
    }
}
