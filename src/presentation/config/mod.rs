mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AlignmentSettings, DevicePreference, DeviceSettings, EngineSettings, IngestionSettings,
    LoggingSettings, ProbeSettings, ProberSetting, ServerSettings, Settings, StorageSettings,
    ValidationSettings, WhisperProviderSetting,
};
