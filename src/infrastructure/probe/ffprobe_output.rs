use std::str::FromStr;

use serde::Deserialize;

use crate::application::ports::ProbeError;
use crate::domain::{ProbeResult, UNKNOWN_CODEC};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

/// Parses `ffprobe -print_format json -show_format -show_streams` output.
///
/// The first audio stream supplies codec, sample rate and channel count; duration and
/// bit rate come from the container, falling back to the stream. Missing numeric
/// fields read as zero, unparseable ones are an error.
pub fn parse_ffprobe_output(stdout: &[u8]) -> Result<ProbeResult, ProbeError> {
    let output: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::ParseFailure(e.to_string()))?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .ok_or(ProbeError::NoAudioStream)?;
    let format = output.format.unwrap_or_default();

    let duration_sec = parse_field::<f64>(
        "duration",
        format.duration.as_deref().or(stream.duration.as_deref()),
    )?
    .unwrap_or(0.0);
    if !duration_sec.is_finite() || duration_sec < 0.0 {
        return Err(ProbeError::ParseFailure(format!(
            "duration out of range: {}",
            duration_sec
        )));
    }

    let sample_rate_hz = parse_field::<u32>("sample_rate", stream.sample_rate.as_deref())?
        .unwrap_or(0);
    let bit_rate_bps = parse_field::<u64>(
        "bit_rate",
        format.bit_rate.as_deref().or(stream.bit_rate.as_deref()),
    )?;

    Ok(ProbeResult {
        duration_sec,
        sample_rate_hz,
        channel_count: stream.channels.unwrap_or(0),
        codec_name: stream
            .codec_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_CODEC.to_string()),
        bit_rate_bps,
        container_format: format.format_name,
        valid: true,
    })
}

// ffprobe prints "N/A" for values it could not determine.
fn parse_field<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ProbeError> {
    match raw.map(str::trim) {
        None | Some("") | Some("N/A") => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ProbeError::ParseFailure(format!("{}: {:?}", name, value))),
    }
}
