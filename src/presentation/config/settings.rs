use std::collections::HashMap;
use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::services::{DurationCrossCheck, PipelineConfig, StageTimeouts};
use crate::domain::{
    DEFAULT_MAX_DURATION_SEC, DEFAULT_MIN_DURATION_SEC, DEFAULT_MIN_SAMPLE_RATE_HZ,
    DEFAULT_MODEL_SIZE, DEFAULT_SUPPORTED_CODECS, ModelSize, ValidationPolicy,
};

use crate::infrastructure::observability::DEFAULT_LOG_FILTER;

use super::Environment;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub ingestion: IngestionSettings,
    pub validation: ValidationSettings,
    pub storage: StorageSettings,
    pub probe: ProbeSettings,
    pub engine: EngineSettings,
    pub device: DeviceSettings,
    pub alignment: AlignmentSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Layers struct defaults, `appsettings.{env}` (optional) and `APP_` variables,
    /// with `__` separating nested keys (`APP_VALIDATION__MAX_DURATION_SEC`).
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("validation.supported_codecs")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            policy: self.validation.policy(),
            default_model_size: ModelSize::new(&self.engine.default_model_size),
            timeouts: StageTimeouts {
                probe: Duration::from_millis(self.probe.timeout_ms),
                transcribe: Duration::from_millis(self.engine.transcribe_timeout_ms),
                align: Duration::from_millis(self.engine.align_timeout_ms),
            },
            duration_check: DurationCrossCheck {
                enabled: self.alignment.cross_check_duration,
                tolerance_sec: self.alignment.duration_tolerance_sec,
            },
            max_concurrent_inference: self.device.max_concurrent_inference,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    pub max_audio_bytes: u64,
    pub fetch_timeout_ms: u64,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            max_audio_bytes: 500 * 1024 * 1024,
            fetch_timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub max_duration_sec: f64,
    pub min_duration_sec: f64,
    pub min_sample_rate_hz: u32,
    pub supported_codecs: Vec<String>,
}

impl ValidationSettings {
    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy::new(
            self.max_duration_sec,
            self.min_duration_sec,
            self.min_sample_rate_hz,
            self.supported_codecs.iter().cloned(),
        )
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_duration_sec: DEFAULT_MAX_DURATION_SEC,
            min_duration_sec: DEFAULT_MIN_DURATION_SEC,
            min_sample_rate_hz: DEFAULT_MIN_SAMPLE_RATE_HZ,
            supported_codecs: DEFAULT_SUPPORTED_CODECS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub local_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            local_path: std::env::temp_dir()
                .join("audioscribe")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProberSetting {
    Ffprobe,
    Symphonia,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub provider: ProberSetting,
    pub ffprobe_path: String,
    pub timeout_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            provider: ProberSetting::Ffprobe,
            ffprobe_path: "ffprobe".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperProviderSetting {
    #[serde(rename = "openai")]
    OpenAi,
    Azure,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub provider: WhisperProviderSetting,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub azure_api_version: Option<String>,
    pub default_model_size: String,
    pub default_model: String,
    pub model_map: HashMap<String, String>,
    pub word_timestamps: bool,
    pub verify_models: bool,
    pub transcribe_timeout_ms: u64,
    pub align_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider: WhisperProviderSetting::OpenAi,
            base_url: None,
            api_key: None,
            azure_api_version: None,
            default_model_size: DEFAULT_MODEL_SIZE.to_string(),
            default_model: "whisper-1".to_string(),
            model_map: HashMap::new(),
            word_timestamps: true,
            verify_models: true,
            transcribe_timeout_ms: 900_000,
            align_timeout_ms: 300_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Auto,
    Cpu,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub preference: DevicePreference,
    pub max_concurrent_inference: Option<usize>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            preference: DevicePreference::Auto,
            max_concurrent_inference: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlignmentSettings {
    pub cross_check_duration: bool,
    pub duration_tolerance_sec: f64,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            cross_check_duration: false,
            duration_tolerance_sec: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_FILTER.to_string(),
            enable_json: false,
        }
    }
}
