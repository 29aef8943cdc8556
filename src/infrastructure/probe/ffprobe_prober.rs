use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{MediaProber, ProbeError};
use crate::domain::ProbeResult;

use super::ffprobe_output::parse_ffprobe_output;

pub const DEFAULT_FFPROBE_BINARY: &str = "ffprobe";

/// Inspects audio with the `ffprobe` binary. The child is killed if the probe
/// future is dropped or times out.
pub struct FfprobeProber {
    binary: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ProbeError> {
        let mut command = Command::new(&self.binary);
        command
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(binary = %self.binary.display(), file = %path.display(), "Running ffprobe");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProbeError::ToolUnavailable(format!(
                    "{} not found",
                    self.binary.display()
                )));
            }
            Ok(Err(e)) => return Err(ProbeError::ToolUnavailable(e.to_string())),
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::ToolFailed(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_ffprobe_output(&output.stdout)
    }
}
