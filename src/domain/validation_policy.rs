use std::collections::BTreeSet;

use serde::Serialize;

use super::ProbeResult;

pub const DEFAULT_MAX_DURATION_SEC: f64 = 3600.0;
pub const DEFAULT_MIN_DURATION_SEC: f64 = 1.0;
pub const DEFAULT_MIN_SAMPLE_RATE_HZ: u32 = 8000;
pub const DEFAULT_SUPPORTED_CODECS: [&str; 5] = ["wav", "mp3", "m4a", "flac", "ogg"];

/// Thresholds applied to every probe result. Built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPolicy {
    pub max_duration_sec: f64,
    pub min_duration_sec: f64,
    pub min_sample_rate_hz: u32,
    pub supported_codecs: BTreeSet<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_duration_sec: DEFAULT_MAX_DURATION_SEC,
            min_duration_sec: DEFAULT_MIN_DURATION_SEC,
            min_sample_rate_hz: DEFAULT_MIN_SAMPLE_RATE_HZ,
            supported_codecs: DEFAULT_SUPPORTED_CODECS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl ValidationPolicy {
    pub fn new(
        max_duration_sec: f64,
        min_duration_sec: f64,
        min_sample_rate_hz: u32,
        supported_codecs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            max_duration_sec,
            min_duration_sec,
            min_sample_rate_hz,
            supported_codecs: supported_codecs
                .into_iter()
                .map(|c| c.into().trim().to_ascii_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// Applies every rule and records each finding; nothing short-circuits.
    pub fn evaluate(&self, probe: &ProbeResult) -> ValidationVerdict {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !probe.valid {
            errors.push("invalid audio file".to_string());
        }

        if probe.duration_sec > self.max_duration_sec {
            errors.push(format!(
                "audio too long: {}s > {}s",
                probe.duration_sec, self.max_duration_sec
            ));
        }

        if probe.duration_sec < self.min_duration_sec {
            errors.push(format!(
                "audio too short: {}s < {}s",
                probe.duration_sec, self.min_duration_sec
            ));
        }

        if !self.is_supported(probe) {
            warnings.push(format!("unsupported format: {}", probe.codec_name));
        }

        if probe.sample_rate_hz < self.min_sample_rate_hz {
            warnings.push(format!(
                "low sample rate: {}Hz < {}Hz",
                probe.sample_rate_hz, self.min_sample_rate_hz
            ));
        }

        ValidationVerdict::new(errors, warnings)
    }

    fn is_supported(&self, probe: &ProbeResult) -> bool {
        probe
            .format_names()
            .any(|name| self.supported_codecs.contains(&name.to_ascii_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationVerdict {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            passed: errors.is_empty(),
            errors,
            warnings,
        }
    }
}
