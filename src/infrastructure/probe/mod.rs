mod ffprobe_output;
mod ffprobe_prober;
mod prober_factory;
mod symphonia_prober;

pub use ffprobe_output::parse_ffprobe_output;
pub use ffprobe_prober::{DEFAULT_FFPROBE_BINARY, FfprobeProber};
pub use prober_factory::{MediaProberFactory, ProberKind};
pub use symphonia_prober::SymphoniaProber;
