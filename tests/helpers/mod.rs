#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tempfile::TempDir;

use audioscribe::application::ports::{
    AlignedTranscript, Aligner, AudioFetcher, EngineError, FetchError, MediaProber, ProbeError,
    RawTranscription, RemoteAudio, SpeechBackend, StagingStore, StagingStoreError, Transcriber,
};
use audioscribe::application::services::{
    DeviceSelector, ModelRegistry, PipelineConfig, TemporaryResourceManager,
    TranscriptionPipeline,
};
use audioscribe::domain::{DeviceKind, ModelSize, ProbeResult, StoragePath, TranscriptSegment};
use audioscribe::infrastructure::storage::LocalStagingStore;

pub const TEST_QUOTA_BYTES: u64 = 1024 * 1024;

pub fn probe(duration_sec: f64, sample_rate_hz: u32, codec: &str) -> ProbeResult {
    ProbeResult {
        duration_sec,
        sample_rate_hz,
        channel_count: 2,
        codec_name: codec.to_string(),
        bit_rate_bps: Some(128_000),
        container_format: None,
        valid: true,
    }
}

/// Counts files left under a scratch directory.
pub fn files_under(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() { files_under(&path) } else { 1 }
        })
        .sum()
}

/// Local store that counts deletes and can be told to fail them.
pub struct CountingStore {
    inner: LocalStagingStore,
    deletes: AtomicUsize,
    fail_deletes: bool,
}

impl CountingStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            inner: LocalStagingStore::new(dir.to_path_buf()).unwrap(),
            deletes: AtomicUsize::new(0),
            fail_deletes: false,
        }
    }

    pub fn failing_deletes(dir: &Path) -> Self {
        Self {
            fail_deletes: true,
            ..Self::new(dir)
        }
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StagingStore for CountingStore {
    async fn store(
        &self,
        path: &StoragePath,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
        content_length: Option<u64>,
    ) -> Result<u64, StagingStoreError> {
        self.inner.store(path, stream, content_length).await
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(StagingStoreError::DeleteFailed("disk unavailable".to_string()));
        }
        self.inner.delete(path).await
    }

    fn local_path(&self, path: &StoragePath) -> Option<PathBuf> {
        self.inner.local_path(path)
    }
}

pub enum FetchReply {
    Body(Vec<u8>),
    Status(u16),
    Transport,
}

pub struct StubFetcher {
    reply: FetchReply,
    announced_length: Option<Option<u64>>,
    pub opened: AtomicUsize,
}

impl StubFetcher {
    pub fn body(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            reply: FetchReply::Body(bytes.into()),
            announced_length: None,
            opened: AtomicUsize::new(0),
        }
    }

    pub fn status(code: u16) -> Self {
        Self {
            reply: FetchReply::Status(code),
            announced_length: None,
            opened: AtomicUsize::new(0),
        }
    }

    pub fn transport_error() -> Self {
        Self {
            reply: FetchReply::Transport,
            announced_length: None,
            opened: AtomicUsize::new(0),
        }
    }

    /// Overrides the Content-Length the fake server announces; `None` mimics
    /// chunked transfer encoding.
    pub fn announcing(mut self, length: Option<u64>) -> Self {
        self.announced_length = Some(length);
        self
    }
}

#[async_trait]
impl AudioFetcher for StubFetcher {
    async fn open(&self, _url: &str) -> Result<RemoteAudio, FetchError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            FetchReply::Body(bytes) => {
                let content_length = self
                    .announced_length
                    .unwrap_or(Some(bytes.len() as u64));
                let chunks: Vec<Result<Bytes, io::Error>> = bytes
                    .chunks(4096)
                    .map(|c| Ok(Bytes::copy_from_slice(c)))
                    .collect();
                Ok(RemoteAudio {
                    content_length,
                    body: stream::iter(chunks).boxed(),
                })
            }
            FetchReply::Status(code) => Err(FetchError::Status(*code)),
            FetchReply::Transport => Err(FetchError::Transport("connection refused".to_string())),
        }
    }
}

pub struct StubProber {
    result: Box<dyn Fn() -> Result<ProbeResult, ProbeError> + Send + Sync>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubProber {
    pub fn returning(probe: ProbeResult) -> Self {
        Self {
            result: Box::new(move || Ok(probe.clone())),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: fn() -> ProbeError) -> Self {
        Self {
            result: Box::new(move || Err(error())),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProber for StubProber {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probe path should exist: {}", path.display());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.result)()
    }
}

/// What the fake speech engine does on each call.
#[derive(Clone, Default)]
pub struct EngineScript {
    pub load_delay: Duration,
    pub load_error: Option<EngineError>,
    pub transcribe_delay: Duration,
    pub transcribe_error: Option<EngineError>,
    pub align_error: Option<EngineError>,
    pub aligned_duration_sec: Option<f64>,
}

#[derive(Default)]
pub struct EngineCalls {
    pub transcriber_loads: AtomicUsize,
    pub aligner_loads: AtomicUsize,
    pub transcribe: AtomicUsize,
    pub align: AtomicUsize,
}

impl EngineCalls {
    pub fn transcribe_count(&self) -> usize {
        self.transcribe.load(Ordering::SeqCst)
    }

    pub fn align_count(&self) -> usize {
        self.align.load(Ordering::SeqCst)
    }

    pub fn transcriber_load_count(&self) -> usize {
        self.transcriber_loads.load(Ordering::SeqCst)
    }
}

pub struct ScriptedBackend {
    script: EngineScript,
    pub calls: Arc<EngineCalls>,
}

impl ScriptedBackend {
    pub fn new(script: EngineScript) -> Self {
        Self {
            script,
            calls: Arc::new(EngineCalls::default()),
        }
    }
}

#[async_trait]
impl SpeechBackend for ScriptedBackend {
    async fn load_transcriber(
        &self,
        _model_size: &ModelSize,
        _device: DeviceKind,
    ) -> Result<Arc<dyn Transcriber>, EngineError> {
        self.calls.transcriber_loads.fetch_add(1, Ordering::SeqCst);
        if !self.script.load_delay.is_zero() {
            tokio::time::sleep(self.script.load_delay).await;
        }
        if let Some(e) = &self.script.load_error {
            return Err(e.clone());
        }
        Ok(Arc::new(ScriptedTranscriber {
            script: self.script.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }

    async fn load_aligner(
        &self,
        _language: &str,
        _device: DeviceKind,
    ) -> Result<Arc<dyn Aligner>, EngineError> {
        self.calls.aligner_loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedAligner {
            script: self.script.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct ScriptedTranscriber {
    script: EngineScript,
    calls: Arc<EngineCalls>,
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(
        &self,
        _audio: &Path,
        language_hint: Option<&str>,
    ) -> Result<RawTranscription, EngineError> {
        self.calls.transcribe.fetch_add(1, Ordering::SeqCst);
        if !self.script.transcribe_delay.is_zero() {
            tokio::time::sleep(self.script.transcribe_delay).await;
        }
        if let Some(e) = &self.script.transcribe_error {
            return Err(e.clone());
        }
        Ok(RawTranscription {
            segments: vec![
                TranscriptSegment::new(0.0, 2.5, "Hello world."),
                TranscriptSegment::new(2.5, 5.0, "This is a test."),
            ],
            language: language_hint.unwrap_or("en").to_string(),
            duration_sec: Some(5.0),
        })
    }
}

struct ScriptedAligner {
    script: EngineScript,
    calls: Arc<EngineCalls>,
}

#[async_trait]
impl Aligner for ScriptedAligner {
    async fn align(
        &self,
        raw: &RawTranscription,
        _audio: &Path,
    ) -> Result<AlignedTranscript, EngineError> {
        self.calls.align.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.script.align_error {
            return Err(e.clone());
        }
        Ok(AlignedTranscript {
            segments: raw.segments.clone(),
            total_duration_sec: self
                .script
                .aligned_duration_sec
                .or(raw.duration_sec)
                .unwrap_or(0.0),
        })
    }
}

/// A pipeline wired to fakes, plus handles to observe them.
pub struct Harness {
    pub pipeline: Arc<TranscriptionPipeline>,
    pub store: Arc<CountingStore>,
    pub fetcher: Arc<StubFetcher>,
    pub prober: Arc<StubProber>,
    pub engine: Arc<EngineCalls>,
    pub scratch: TempDir,
}

impl Harness {
    pub fn new(fetcher: StubFetcher, prober: StubProber, script: EngineScript) -> Self {
        Self::with_config(fetcher, prober, script, PipelineConfig::default())
    }

    pub fn with_config(
        fetcher: StubFetcher,
        prober: StubProber,
        script: EngineScript,
        config: PipelineConfig,
    ) -> Self {
        let scratch = TempDir::new().unwrap();
        let store = Arc::new(CountingStore::new(scratch.path()));
        Self::assemble(scratch, store, fetcher, prober, script, config)
    }

    pub fn assemble(
        scratch: TempDir,
        store: Arc<CountingStore>,
        fetcher: StubFetcher,
        prober: StubProber,
        script: EngineScript,
        config: PipelineConfig,
    ) -> Self {
        let fetcher = Arc::new(fetcher);
        let prober = Arc::new(prober);
        let backend = ScriptedBackend::new(script);
        let engine = Arc::clone(&backend.calls);

        let resources = Arc::new(TemporaryResourceManager::new(
            Arc::clone(&store) as Arc<dyn StagingStore>,
            TEST_QUOTA_BYTES,
        ));
        let pipeline = Arc::new(TranscriptionPipeline::new(
            resources,
            Arc::clone(&fetcher) as Arc<dyn AudioFetcher>,
            Arc::clone(&prober) as Arc<dyn MediaProber>,
            Arc::new(DeviceSelector::fixed(DeviceKind::Cpu)),
            Arc::new(ModelRegistry::new(Arc::new(backend))),
            config,
        ));

        Self {
            pipeline,
            store,
            fetcher,
            prober,
            engine,
            scratch,
        }
    }

    pub fn leftover_files(&self) -> usize {
        files_under(self.scratch.path())
    }
}

/// Silent 16-bit mono PCM WAV.
pub fn wav_bytes(seconds: f64, sample_rate: u32) -> Vec<u8> {
    let frames = (seconds * sample_rate as f64) as u32;
    let data_len = frames * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}
