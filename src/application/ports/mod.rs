mod accelerator_detector;
mod audio_fetcher;
mod media_prober;
mod speech_engine;
mod staging_store;

pub use accelerator_detector::AcceleratorDetector;
pub use audio_fetcher::{AudioFetcher, FetchError, RemoteAudio};
pub use media_prober::{MediaProber, ProbeError};
pub use speech_engine::{
    AlignedTranscript, Aligner, EngineError, RawTranscription, SpeechBackend, Transcriber,
};
pub use staging_store::{StagingStore, StagingStoreError};
