mod device_selector;
mod ingestion_resolver;
mod model_registry;
mod pipeline_error;
mod temporary_resources;
mod transcription_pipeline;

pub use device_selector::DeviceSelector;
pub use ingestion_resolver::IngestionResolver;
pub use model_registry::{Capability, ModelKey, ModelRegistry, SingleFlightCache};
pub use pipeline_error::{IngestionError, PipelineError, ResourceError};
pub use temporary_resources::{TemporaryResource, TemporaryResourceManager};
pub use transcription_pipeline::{
    DurationCrossCheck, Inspection, PipelineConfig, PipelineOutcome, StageTimeouts,
    TranscriptionPipeline, TranscriptionRequest,
};
