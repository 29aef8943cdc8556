use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{MediaProber, ProbeError};
use crate::domain::{ProbeResult, UNKNOWN_CODEC};

/// In-process prober for hosts without ffprobe. Reads container headers and, when
/// the container does not declare a frame count, walks packets to total the duration.
#[derive(Debug, Default)]
pub struct SymphoniaProber;

impl SymphoniaProber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaProber for SymphoniaProber {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ProbeError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || probe_file(&path))
            .await
            .map_err(|e| ProbeError::ToolFailed(format!("probe task: {}", e)))?
    }
}

fn probe_file(path: &Path) -> Result<ProbeResult, ProbeError> {
    let file = File::open(path).map_err(|e| ProbeError::ToolFailed(format!("open: {}", e)))?;
    let file_len = file.metadata().map(|m| m.len()).ok();
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mut hint = Hint::new();
    if let Some(ext) = extension.as_deref() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| match e {
            SymphoniaError::Unsupported(_) => ProbeError::NoAudioStream,
            other => ProbeError::ParseFailure(other.to_string()),
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .ok_or(ProbeError::NoAudioStream)?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate_hz = params.sample_rate.unwrap_or(0);
    let channel_count = params.channels.map(|c| c.count() as u32).unwrap_or(0);
    let codec_name = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| UNKNOWN_CODEC.to_string());

    let frames = match params.n_frames {
        Some(n) => n,
        None => {
            let mut total = 0u64;
            loop {
                match format.next_packet() {
                    Ok(packet) if packet.track_id() == track_id => total += packet.dur,
                    Ok(_) => {}
                    Err(SymphoniaError::IoError(ref e))
                        if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        break;
                    }
                    Err(e) => return Err(ProbeError::ParseFailure(format!("packet: {}", e))),
                }
            }
            total
        }
    };

    let duration_sec = match (params.time_base, sample_rate_hz) {
        (Some(tb), _) if params.n_frames.is_none() => {
            let time = tb.calc_time(frames);
            time.seconds as f64 + time.frac
        }
        (_, rate) if rate > 0 => frames as f64 / rate as f64,
        _ => 0.0,
    };

    let bit_rate_bps = file_len
        .filter(|_| duration_sec > 0.0)
        .map(|len| (len as f64 * 8.0 / duration_sec) as u64);

    Ok(ProbeResult {
        duration_sec,
        sample_rate_hz,
        channel_count,
        codec_name: codec_name.clone(),
        bit_rate_bps,
        container_format: extension.or_else(|| container_for_codec(&codec_name)),
        valid: true,
    })
}

/// Container implied by the decoded codec, for staged objects without an extension.
fn container_for_codec(codec: &str) -> Option<String> {
    let container = match codec {
        c if c.starts_with("pcm_") => "wav",
        "mp1" | "mp2" | "mp3" => "mp3",
        "flac" => "flac",
        "vorbis" | "opus" => "ogg",
        "aac" | "alac" => "m4a",
        _ => return None,
    };
    Some(container.to_string())
}
