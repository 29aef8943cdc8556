use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::MediaProber;

use super::ffprobe_prober::FfprobeProber;
use super::symphonia_prober::SymphoniaProber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProberKind {
    Ffprobe,
    Symphonia,
}

pub struct MediaProberFactory;

impl MediaProberFactory {
    pub fn create(kind: ProberKind, binary: PathBuf, timeout: Duration) -> Arc<dyn MediaProber> {
        match kind {
            ProberKind::Ffprobe => Arc::new(FfprobeProber::new(binary, timeout)),
            ProberKind::Symphonia => Arc::new(SymphoniaProber::new()),
        }
    }
}
