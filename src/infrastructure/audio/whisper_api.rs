use std::path::Path;

use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{EngineError, RawTranscription};
use crate::domain::{TranscriptSegment, WordTiming};

pub const DEFAULT_LANGUAGE: &str = "en";

/// `response_format=verbose_json` body shared by the OpenAI and Azure endpoints.
#[derive(Debug, Deserialize)]
pub struct VerboseTranscription {
    #[serde(default)]
    pub text: String,
    pub language: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub segments: Vec<VerboseSegment>,
    pub words: Option<Vec<VerboseWord>>,
}

#[derive(Debug, Deserialize)]
pub struct VerboseSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VerboseWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl VerboseTranscription {
    /// Converts the provider body into engine output. Word timings, when present,
    /// are attached to the segment whose start precedes them.
    pub fn into_raw(self, language_hint: Option<&str>) -> RawTranscription {
        let language = self
            .language
            .as_deref()
            .map(normalize_language)
            .or_else(|| language_hint.map(normalize_language))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let mut segments: Vec<TranscriptSegment> = if self.segments.is_empty() {
            let text = self.text.trim();
            if text.is_empty() {
                Vec::new()
            } else {
                vec![TranscriptSegment::new(0.0, self.duration.unwrap_or(0.0), text)]
            }
        } else {
            self.segments
                .into_iter()
                .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
                .collect()
        };

        if let Some(words) = self.words {
            attach_words(&mut segments, words);
        }

        RawTranscription {
            segments,
            language,
            duration_sec: self.duration,
        }
    }
}

fn attach_words(segments: &mut [TranscriptSegment], words: Vec<VerboseWord>) {
    if segments.is_empty() {
        return;
    }
    for word in words {
        let text = word.word.trim();
        if text.is_empty() {
            continue;
        }
        let index = segments
            .iter()
            .rposition(|s| s.start_sec <= word.start)
            .unwrap_or(0);
        segments[index]
            .words
            .get_or_insert_with(Vec::new)
            .push(WordTiming {
                text: text.to_string(),
                start_sec: word.start,
                end_sec: word.end,
            });
    }
}

/// Whisper reports languages by English name; downstream keys use ISO 639-1 codes.
pub fn normalize_language(language: &str) -> String {
    let lower = language.trim().to_ascii_lowercase();
    let code = match lower.as_str() {
        "english" => "en",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "portuguese" => "pt",
        "dutch" => "nl",
        "russian" => "ru",
        "chinese" => "zh",
        "japanese" => "ja",
        "korean" => "ko",
        "arabic" => "ar",
        "hindi" => "hi",
        "polish" => "pl",
        "turkish" => "tr",
        "ukrainian" => "uk",
        "swedish" => "sv",
        "norwegian" | "nynorsk" => "no",
        "danish" => "da",
        "finnish" => "fi",
        _ => return lower,
    };
    code.to_string()
}

/// Builds the multipart form common to both providers.
pub async fn transcription_form(
    audio: &Path,
    word_timestamps: bool,
    language_hint: Option<&str>,
) -> Result<multipart::Form, EngineError> {
    let bytes = tokio::fs::read(audio)
        .await
        .map_err(|e| EngineError::InferenceFailed(format!("read audio: {}", e)))?;

    let file_name = audio
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio")
        .to_string();
    let file_part = multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime_for(audio))
        .map_err(|e| EngineError::InferenceFailed(format!("mime: {}", e)))?;

    let mut form = multipart::Form::new()
        .text("response_format", "verbose_json")
        .text("timestamp_granularities[]", "segment")
        .part("file", file_part);
    if word_timestamps {
        form = form.text("timestamp_granularities[]", "word");
    }
    if let Some(language) = language_hint.map(str::trim).filter(|l| !l.is_empty()) {
        form = form.text("language", language.to_string());
    }
    Ok(form)
}

/// Turns a provider response into engine output, mapping HTTP failures to
/// [`EngineError::InferenceFailed`].
pub async fn read_transcription(
    response: reqwest::Response,
    language_hint: Option<&str>,
) -> Result<RawTranscription, EngineError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(EngineError::InferenceFailed(format!(
            "status {}: {}",
            status, body
        )));
    }

    let body: VerboseTranscription = response
        .json()
        .await
        .map_err(|e| EngineError::InferenceFailed(format!("parse response: {}", e)))?;

    Ok(body.into_raw(language_hint))
}

fn mime_for(audio: &Path) -> &'static str {
    match audio
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}
