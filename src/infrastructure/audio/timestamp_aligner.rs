use std::path::Path;

use async_trait::async_trait;

use crate::application::ports::{AlignedTranscript, Aligner, EngineError, RawTranscription};
use crate::domain::TranscriptSegment;

/// Refines coarse segments into ordered, non-overlapping spans inside the audio.
///
/// Segment bounds are tightened to their word timings when present and clamped to
/// the reported duration. Blank segments are dropped.
pub struct TimestampAligner {
    language: String,
}

impl TimestampAligner {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn align_segments(&self, raw: &RawTranscription) -> Result<AlignedTranscript, EngineError> {
        let last_end = raw
            .segments
            .iter()
            .map(|s| s.end_sec)
            .fold(0.0_f64, f64::max);
        let total_duration_sec = raw.duration_sec.unwrap_or(last_end);
        if !total_duration_sec.is_finite() || total_duration_sec < 0.0 {
            return Err(EngineError::InferenceFailed(format!(
                "unusable audio duration: {}",
                total_duration_sec
            )));
        }

        let mut segments: Vec<TranscriptSegment> = raw
            .segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| tighten(s, total_duration_sec))
            .collect();
        segments.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));

        let mut cursor = 0.0_f64;
        for segment in &mut segments {
            if segment.start_sec < cursor {
                segment.start_sec = cursor;
            }
            if segment.end_sec < segment.start_sec {
                segment.end_sec = segment.start_sec;
            }
            contain_words(segment);
            cursor = segment.end_sec;
        }

        Ok(AlignedTranscript {
            segments,
            total_duration_sec,
        })
    }
}

#[async_trait]
impl Aligner for TimestampAligner {
    async fn align(
        &self,
        raw: &RawTranscription,
        _audio: &Path,
    ) -> Result<AlignedTranscript, EngineError> {
        let aligned = self.align_segments(raw)?;
        tracing::debug!(
            language = %self.language,
            input_segments = raw.segments.len(),
            output_segments = aligned.segments.len(),
            "Segments aligned"
        );
        Ok(aligned)
    }
}

fn tighten(segment: &TranscriptSegment, limit: f64) -> TranscriptSegment {
    let clamp = |t: f64| t.clamp(0.0, limit);

    let words = segment.words.as_ref().map(|words| {
        let mut words = words.clone();
        for word in &mut words {
            word.start_sec = clamp(word.start_sec);
            word.end_sec = clamp(word.end_sec).max(word.start_sec);
        }
        words.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
        words
    });

    let (start, end) = match words.as_deref() {
        Some([first, .., last]) => (first.start_sec, last.end_sec),
        Some([only]) => (only.start_sec, only.end_sec),
        _ => (clamp(segment.start_sec), clamp(segment.end_sec)),
    };

    TranscriptSegment {
        start_sec: start,
        end_sec: end.max(start),
        text: segment.text.trim().to_string(),
        words,
    }
}

// Words never leave their segment, even after it was pushed past an overlap.
fn contain_words(segment: &mut TranscriptSegment) {
    let (start, end) = (segment.start_sec, segment.end_sec);
    if let Some(words) = segment.words.as_mut() {
        for word in words {
            word.start_sec = word.start_sec.clamp(start, end);
            word.end_sec = word.end_sec.clamp(word.start_sec, end);
        }
    }
}
