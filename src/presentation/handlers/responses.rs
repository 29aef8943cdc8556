use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::EngineError;
use crate::application::services::{Inspection, IngestionError, PipelineError, PipelineOutcome};
use crate::domain::{
    FailedStage, ProbeResult, TranscriptSegment, TranscriptionResult, ValidationVerdict,
    WordTiming,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub text: String,
    pub segments: Vec<SegmentResponse>,
    pub language: String,
    pub duration_sec: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordResponse>>,
}

#[derive(Debug, Serialize)]
pub struct WordResponse {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Serialize)]
pub struct RejectedResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureResponse {
    pub stage: FailedStage,
    pub error_kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct InspectResponse {
    pub probe: ProbeResult,
    pub validation: ValidationVerdict,
}

impl From<TranscriptionResult> for TranscriptResponse {
    fn from(result: TranscriptionResult) -> Self {
        Self {
            text: result.full_text,
            segments: result.segments.into_iter().map(SegmentResponse::from).collect(),
            language: result.language,
            duration_sec: result.total_duration_sec,
            warnings: Vec::new(),
        }
    }
}

impl From<TranscriptSegment> for SegmentResponse {
    fn from(segment: TranscriptSegment) -> Self {
        Self {
            start: segment.start_sec,
            end: segment.end_sec,
            text: segment.text,
            words: segment
                .words
                .map(|words| words.into_iter().map(WordResponse::from).collect()),
        }
    }
}

impl From<WordTiming> for WordResponse {
    fn from(word: WordTiming) -> Self {
        Self {
            word: word.text,
            start: word.start_sec,
            end: word.end_sec,
        }
    }
}

impl From<ValidationVerdict> for RejectedResponse {
    fn from(verdict: ValidationVerdict) -> Self {
        Self {
            valid: verdict.passed,
            errors: verdict.errors,
            warnings: verdict.warnings,
        }
    }
}

pub fn outcome_response(outcome: PipelineOutcome) -> Response {
    match outcome {
        PipelineOutcome::Transcribed { result, warnings } => {
            let mut body = TranscriptResponse::from(result);
            body.warnings = warnings;
            (StatusCode::OK, Json(body)).into_response()
        }
        PipelineOutcome::Rejected(verdict) => {
            (StatusCode::OK, Json(RejectedResponse::from(verdict))).into_response()
        }
    }
}

pub fn inspection_response(inspection: Inspection) -> Response {
    (
        StatusCode::OK,
        Json(InspectResponse {
            probe: inspection.probe,
            validation: inspection.verdict,
        }),
    )
        .into_response()
}

pub fn failure_response(error: &PipelineError) -> Response {
    (
        status_for(error),
        Json(FailureResponse {
            stage: error.stage(),
            error_kind: error.kind(),
            message: error.to_string(),
        }),
    )
        .into_response()
}

pub fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Ingest(e) => match e {
            IngestionError::Network(_) => StatusCode::BAD_GATEWAY,
            IngestionError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            IngestionError::UploadMalformed(_) | IngestionError::InvalidUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            IngestionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        PipelineError::Transcribe(e) | PipelineError::Align(e) => match e {
            EngineError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            EngineError::ModelLoadFailed(_) | EngineError::InferenceFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
    }
}
