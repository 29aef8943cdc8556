use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use audioscribe::application::ports::{AudioFetcher, SpeechBackend, StagingStore};
use audioscribe::application::services::{
    DeviceSelector, ModelRegistry, TemporaryResourceManager, TranscriptionPipeline,
};
use audioscribe::domain::DeviceKind;
use audioscribe::infrastructure::audio::{
    WhisperBackendConfig, WhisperHttpBackend, WhisperProvider,
};
use audioscribe::infrastructure::device::SystemAcceleratorDetector;
use audioscribe::infrastructure::fetch::HttpAudioFetcher;
use audioscribe::infrastructure::observability::{TracingConfig, init_tracing};
use audioscribe::infrastructure::probe::{MediaProberFactory, ProberKind};
use audioscribe::infrastructure::storage::LocalStagingStore;
use audioscribe::presentation::config::{
    DevicePreference, ProberSetting, Settings, WhisperProviderSetting,
};
use audioscribe::presentation::{AppState, Environment, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    let tracing_config = TracingConfig::new(
        environment.as_str(),
        settings.logging.enable_json || environment.is_prod(),
        settings.logging.level.clone(),
    );
    init_tracing(&tracing_config).context("Failed to initialize tracing")?;

    let store: Arc<dyn StagingStore> = Arc::new(
        LocalStagingStore::new(PathBuf::from(&settings.storage.local_path))
            .context("Failed to prepare scratch storage")?,
    );
    let resources = Arc::new(TemporaryResourceManager::new(
        store,
        settings.ingestion.max_audio_bytes,
    ));

    let fetcher: Arc<dyn AudioFetcher> = Arc::new(
        HttpAudioFetcher::new(Duration::from_millis(settings.ingestion.fetch_timeout_ms))
            .context("Failed to build HTTP client")?,
    );

    let prober_kind = match settings.probe.provider {
        ProberSetting::Ffprobe => ProberKind::Ffprobe,
        ProberSetting::Symphonia => ProberKind::Symphonia,
    };
    let prober = MediaProberFactory::create(
        prober_kind,
        PathBuf::from(&settings.probe.ffprobe_path),
        Duration::from_millis(settings.probe.timeout_ms),
    );

    let devices = Arc::new(match settings.device.preference {
        DevicePreference::Cpu => DeviceSelector::fixed(DeviceKind::Cpu),
        DevicePreference::Auto => DeviceSelector::new(Box::new(SystemAcceleratorDetector::new())),
    });

    let backend: Arc<dyn SpeechBackend> = Arc::new(
        WhisperHttpBackend::new(whisper_config(&settings))
            .context("Failed to build speech backend")?,
    );
    let models = Arc::new(ModelRegistry::new(backend));

    let pipeline = Arc::new(TranscriptionPipeline::new(
        resources,
        fetcher,
        prober,
        Arc::clone(&devices),
        models,
        settings.pipeline_config(),
    ));

    // Detect once at startup so the first request does not pay for it.
    devices.current_device();

    let state = AppState::new(pipeline, settings.ingestion.max_audio_bytes);
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!(%addr, environment = %environment, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn whisper_config(settings: &Settings) -> WhisperBackendConfig {
    let engine = &settings.engine;
    WhisperBackendConfig {
        provider: match engine.provider {
            WhisperProviderSetting::OpenAi => WhisperProvider::OpenAi,
            WhisperProviderSetting::Azure => WhisperProvider::Azure,
        },
        base_url: engine.base_url.clone(),
        api_key: engine.api_key.clone(),
        azure_api_version: engine.azure_api_version.clone(),
        default_model: engine.default_model.clone(),
        model_map: engine.model_map.clone(),
        word_timestamps: engine.word_timestamps,
        verify_models: engine.verify_models,
        request_timeout: Duration::from_millis(engine.transcribe_timeout_ms),
    }
}
