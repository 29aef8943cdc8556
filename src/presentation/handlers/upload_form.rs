use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use bytes::Bytes;

use crate::application::services::{IngestionError, PipelineError};
use crate::domain::AudioSource;

/// Fields accepted by the file endpoints. Only `file` is required.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<(Bytes, Option<String>)>,
    pub language: Option<String>,
    pub model_size: Option<String>,
    pub declared_size: Option<u64>,
}

impl UploadForm {
    /// Reads every field. Form failures surface as ingest-stage errors so they
    /// render like any other pipeline failure.
    pub async fn read(mut multipart: Multipart, limit_bytes: u64) -> Result<Self, PipelineError> {
        let mut form = UploadForm::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(f)) => f,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read multipart");
                    return Err(multipart_failure(&e, limit_bytes));
                }
            };

            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().map(String::from);
                    let data = field.bytes().await.map_err(|e| {
                        tracing::warn!(error = %e, "Failed to read file bytes");
                        multipart_failure(&e, limit_bytes)
                    })?;
                    tracing::debug!(bytes = data.len(), filename = ?filename, "File data received");
                    form.file = Some((data, filename));
                }
                "language" | "model_size" | "declared_size" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| multipart_failure(&e, limit_bytes))?;
                    form.set_text(&name, value.trim())?;
                }
                other => {
                    tracing::debug!(field = %other, "Ignoring unknown multipart field");
                }
            }
        }

        Ok(form)
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PipelineError> {
        if value.is_empty() {
            return Ok(());
        }
        match name {
            "language" => self.language = Some(value.to_string()),
            "model_size" => self.model_size = Some(value.to_string()),
            _ => {
                let size = value.parse::<u64>().map_err(|_| {
                    malformed(format!("declared_size is not a byte count: {}", value))
                })?;
                self.declared_size = Some(size);
            }
        }
        Ok(())
    }

    /// The upload as an audio source; the declared size defaults to the received length.
    pub fn into_source(
        self,
    ) -> Result<(AudioSource, Option<String>, Option<String>), PipelineError> {
        let Some((bytes, filename)) = self.file else {
            tracing::warn!("Upload request with no file");
            return Err(malformed("no file uploaded"));
        };

        let declared_len = self.declared_size.unwrap_or(bytes.len() as u64);
        let source = AudioSource::Upload {
            bytes,
            declared_len,
            filename,
        };
        Ok((source, self.language, self.model_size))
    }
}

fn multipart_failure(error: &MultipartError, limit_bytes: u64) -> PipelineError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return PipelineError::Ingest(IngestionError::TooLarge { limit_bytes });
    }
    malformed(error.body_text())
}

fn malformed(message: impl Into<String>) -> PipelineError {
    PipelineError::Ingest(IngestionError::UploadMalformed(message.into()))
}
