use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
}

/// A contiguous span of transcript text. The aligner guarantees segments arrive
/// ordered by `start_sec` and non-overlapping; that contract is not re-checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_sec: f64,
    pub end_sec: f64,
    pub text: String,
    pub words: Option<Vec<WordTiming>>,
}

impl TranscriptSegment {
    pub fn new(start_sec: f64, end_sec: f64, text: impl Into<String>) -> Self {
        Self {
            start_sec,
            end_sec,
            text: text.into(),
            words: None,
        }
    }

    pub fn with_words(mut self, words: Vec<WordTiming>) -> Self {
        self.words = Some(words);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub full_text: String,
    pub language: String,
    pub segments: Vec<TranscriptSegment>,
    pub total_duration_sec: f64,
}

impl TranscriptionResult {
    /// Joins the segment texts in order to form the full transcript.
    pub fn from_segments(
        language: impl Into<String>,
        segments: Vec<TranscriptSegment>,
        total_duration_sec: f64,
    ) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            full_text,
            language: language.into(),
            segments,
            total_duration_sec,
        }
    }
}
