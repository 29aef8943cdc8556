use serde::Serialize;

pub const UNKNOWN_CODEC: &str = "unknown";

/// Structural metadata of one audio file, produced once per invocation before any
/// validation or transcription decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub duration_sec: f64,
    pub sample_rate_hz: u32,
    pub channel_count: u32,
    pub codec_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate_bps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_format: Option<String>,
    pub valid: bool,
}

impl ProbeResult {
    /// The soft-failure result: numeric fields zeroed, codec unknown.
    pub fn invalid() -> Self {
        Self {
            duration_sec: 0.0,
            sample_rate_hz: 0,
            channel_count: 0,
            codec_name: UNKNOWN_CODEC.to_string(),
            bit_rate_bps: None,
            container_format: None,
            valid: false,
        }
    }

    /// Codec name followed by every container name the inspection tool reported.
    pub fn format_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.codec_name.as_str()).chain(
            self.container_format
                .iter()
                .flat_map(|c| c.split(','))
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }
}
