use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::presentation::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub device: &'static str,
    pub loaded_models: usize,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        device: state.pipeline.device().as_str(),
        loaded_models: state.pipeline.loaded_models(),
    })
}
