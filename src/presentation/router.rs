use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    health_handler, inspect_file_handler, inspect_handler, transcribe_file_handler,
    transcribe_handler,
};
use crate::presentation::state::AppState;

// Room for multipart boundaries and the small text fields next to the file.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let body_limit = usize::try_from(state.max_audio_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/transcribe", post(transcribe_handler))
        .route("/api/v1/transcribe-file", post(transcribe_file_handler))
        .route("/api/v1/inspect", post(inspect_handler))
        .route("/api/v1/inspect-file", post(inspect_file_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
