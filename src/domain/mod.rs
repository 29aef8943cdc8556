mod audio_source;
mod device_kind;
mod invocation_id;
mod model_size;
mod pipeline_state;
mod probe_result;
mod storage_path;
mod transcript;
mod validation_policy;

pub use audio_source::AudioSource;
pub use device_kind::DeviceKind;
pub use invocation_id::InvocationId;
pub use model_size::{DEFAULT_MODEL_SIZE, ModelSize};
pub use pipeline_state::{FailedStage, PipelineState};
pub use probe_result::{ProbeResult, UNKNOWN_CODEC};
pub use storage_path::StoragePath;
pub use transcript::{TranscriptSegment, TranscriptionResult, WordTiming};
pub use validation_policy::{
    DEFAULT_MAX_DURATION_SEC, DEFAULT_MIN_DURATION_SEC, DEFAULT_MIN_SAMPLE_RATE_HZ,
    DEFAULT_SUPPORTED_CODECS, ValidationPolicy, ValidationVerdict,
};
