use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;

use crate::application::ports::{
    AlignedTranscript, AudioFetcher, EngineError, MediaProber, RawTranscription,
};
use crate::domain::{
    AudioSource, DeviceKind, InvocationId, ModelSize, PipelineState, ProbeResult,
    TranscriptionResult, ValidationPolicy, ValidationVerdict,
};

use super::device_selector::DeviceSelector;
use super::ingestion_resolver::IngestionResolver;
use super::model_registry::ModelRegistry;
use super::pipeline_error::PipelineError;
use super::temporary_resources::{TemporaryResource, TemporaryResourceManager};

#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub source: AudioSource,
    pub language: Option<String>,
    pub model_size: Option<String>,
}

impl TranscriptionRequest {
    pub fn new(source: AudioSource) -> Self {
        Self {
            source,
            language: None,
            model_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Transcribed {
        result: TranscriptionResult,
        warnings: Vec<String>,
    },
    /// The gate refused the audio. A normal outcome, not a failure.
    Rejected(ValidationVerdict),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub probe: ProbeResult,
    pub verdict: ValidationVerdict,
}

#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    pub probe: Duration,
    pub transcribe: Duration,
    pub align: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(30),
            transcribe: Duration::from_secs(900),
            align: Duration::from_secs(300),
        }
    }
}

/// Optional hardening: compare the aligned duration against the probed one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationCrossCheck {
    pub enabled: bool,
    pub tolerance_sec: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub policy: ValidationPolicy,
    pub default_model_size: ModelSize,
    pub timeouts: StageTimeouts,
    pub duration_check: DurationCrossCheck,
    /// Concurrent inference calls allowed on the accelerated device; `None` means unbounded.
    pub max_concurrent_inference: Option<usize>,
}

/// Runs one invocation through fetch, probe, validation, transcription and alignment.
pub struct TranscriptionPipeline {
    resources: Arc<TemporaryResourceManager>,
    resolver: IngestionResolver,
    prober: Arc<dyn MediaProber>,
    devices: Arc<DeviceSelector>,
    models: Arc<ModelRegistry>,
    inference_gate: Option<Arc<Semaphore>>,
    config: PipelineConfig,
}

impl TranscriptionPipeline {
    pub fn new(
        resources: Arc<TemporaryResourceManager>,
        fetcher: Arc<dyn AudioFetcher>,
        prober: Arc<dyn MediaProber>,
        devices: Arc<DeviceSelector>,
        models: Arc<ModelRegistry>,
        config: PipelineConfig,
    ) -> Self {
        let inference_gate = config
            .max_concurrent_inference
            .filter(|permits| *permits > 0)
            .map(|permits| Arc::new(Semaphore::new(permits)));

        Self {
            resolver: IngestionResolver::new(fetcher, Arc::clone(&resources)),
            resources,
            prober,
            devices,
            models,
            inference_gate,
            config,
        }
    }

    pub fn device(&self) -> DeviceKind {
        self.devices.current_device()
    }

    pub fn loaded_models(&self) -> usize {
        self.models.loaded_count()
    }

    pub async fn run(&self, request: TranscriptionRequest) -> Result<PipelineOutcome, PipelineError> {
        let invocation_id = InvocationId::new();
        let span = tracing::info_span!(
            "pipeline",
            invocation_id = %invocation_id,
            source = request.source.kind(),
        );

        async {
            let started = Instant::now();
            let mut run = StateTracker::new();
            let resource = self.resources.acquire(
                invocation_id,
                request.source.name_hint(),
                request.source.size_hint(),
            );

            let outcome = self.transcribe_resource(&mut run, &resource, &request).await;
            self.resources.release(&resource).await;

            log_finish(&run, &outcome, started);
            outcome
        }
        .instrument(span)
        .await
    }

    /// Fetches, probes and validates without transcribing.
    pub async fn inspect(&self, source: AudioSource) -> Result<Inspection, PipelineError> {
        let invocation_id = InvocationId::new();
        let span = tracing::info_span!(
            "inspection",
            invocation_id = %invocation_id,
            source = source.kind(),
        );

        async {
            let started = Instant::now();
            let mut run = StateTracker::new();
            let resource =
                self.resources
                    .acquire(invocation_id, source.name_hint(), source.size_hint());

            let outcome = match self.gate(&mut run, &resource, &source).await {
                Ok((probe, verdict)) => {
                    run.advance(PipelineState::Completed);
                    Ok(Inspection { probe, verdict })
                }
                Err(e) => Err(e),
            };
            self.resources.release(&resource).await;

            log_finish(&run, &outcome, started);
            outcome
        }
        .instrument(span)
        .await
    }

    async fn transcribe_resource(
        &self,
        run: &mut StateTracker,
        resource: &TemporaryResource,
        request: &TranscriptionRequest,
    ) -> Result<PipelineOutcome, PipelineError> {
        let (probe, verdict) = self.gate(run, resource, &request.source).await?;

        if !verdict.passed {
            run.advance(PipelineState::Rejected);
            tracing::info!(errors = ?verdict.errors, "Audio rejected by validation");
            return Ok(PipelineOutcome::Rejected(verdict));
        }

        run.advance(PipelineState::Transcribing);
        let audio = match resource.local_path() {
            Some(path) => path,
            None => {
                return Err(run.fail(PipelineError::Transcribe(EngineError::InferenceFailed(
                    "audio is not addressable on local storage".to_string(),
                ))));
            }
        };
        let device = self.devices.current_device();
        let model_size =
            ModelSize::resolve(request.model_size.as_deref(), &self.config.default_model_size);

        let raw = self
            .transcribe(audio, &model_size, device, request.language.as_deref())
            .await
            .map_err(|e| run.fail(PipelineError::Transcribe(e)))?;
        tracing::debug!(
            segments = raw.segments.len(),
            language = %raw.language,
            "Raw transcription produced"
        );

        run.advance(PipelineState::Aligning);
        let aligned = self
            .align(&raw, audio, device)
            .await
            .map_err(|e| run.fail(PipelineError::Align(e)))?;

        let total_duration_sec = self.reconcile_duration(aligned.total_duration_sec, &probe);
        let result =
            TranscriptionResult::from_segments(raw.language, aligned.segments, total_duration_sec);

        run.advance(PipelineState::Completed);
        Ok(PipelineOutcome::Transcribed {
            result,
            warnings: verdict.warnings,
        })
    }

    /// Fetching → Probing → Validating. Probe failures are absorbed into an invalid
    /// probe result; only ingestion can fail here.
    async fn gate(
        &self,
        run: &mut StateTracker,
        resource: &TemporaryResource,
        source: &AudioSource,
    ) -> Result<(ProbeResult, ValidationVerdict), PipelineError> {
        self.resolver
            .resolve(source, resource)
            .await
            .map_err(|e| run.fail(PipelineError::Ingest(e)))?;

        run.advance(PipelineState::Probing);
        let probe = self.probe(resource).await;

        run.advance(PipelineState::Validating);
        let verdict = self.config.policy.evaluate(&probe);
        tracing::debug!(
            passed = verdict.passed,
            errors = verdict.errors.len(),
            warnings = verdict.warnings.len(),
            "Validation verdict"
        );

        Ok((probe, verdict))
    }

    async fn probe(&self, resource: &TemporaryResource) -> ProbeResult {
        let Some(path) = resource.local_path() else {
            tracing::warn!(path = %resource.path(), "Audio not on local storage; cannot probe");
            return ProbeResult::invalid();
        };

        match tokio::time::timeout(self.config.timeouts.probe, self.prober.probe(path)).await {
            Ok(Ok(probe)) => {
                tracing::debug!(
                    duration_sec = probe.duration_sec,
                    sample_rate_hz = probe.sample_rate_hz,
                    channels = probe.channel_count,
                    codec = %probe.codec_name,
                    "Audio probed"
                );
                probe
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Probe failed; treating audio as invalid");
                ProbeResult::invalid()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.timeouts.probe.as_millis() as u64,
                    "Probe timed out; treating audio as invalid"
                );
                ProbeResult::invalid()
            }
        }
    }

    async fn transcribe(
        &self,
        audio: &Path,
        model_size: &ModelSize,
        device: DeviceKind,
        language_hint: Option<&str>,
    ) -> Result<RawTranscription, EngineError> {
        let transcriber = self.models.transcriber(model_size, device).await?;
        let _permit = self.acquire_device(device).await?;

        let limit = self.config.timeouts.transcribe;
        tokio::time::timeout(limit, transcriber.transcribe(audio, language_hint))
            .await
            .map_err(|_| EngineError::Timeout(limit))?
    }

    async fn align(
        &self,
        raw: &RawTranscription,
        audio: &Path,
        device: DeviceKind,
    ) -> Result<AlignedTranscript, EngineError> {
        let aligner = self.models.aligner(&raw.language, device).await?;
        let _permit = self.acquire_device(device).await?;

        let limit = self.config.timeouts.align;
        tokio::time::timeout(limit, aligner.align(raw, audio))
            .await
            .map_err(|_| EngineError::Timeout(limit))?
    }

    async fn acquire_device(
        &self,
        device: DeviceKind,
    ) -> Result<Option<OwnedSemaphorePermit>, EngineError> {
        match (&self.inference_gate, device) {
            (Some(gate), DeviceKind::Accelerated) => Arc::clone(gate)
                .acquire_owned()
                .await
                .map(Some)
                .map_err(|e| EngineError::DeviceUnavailable(e.to_string())),
            _ => Ok(None),
        }
    }

    fn reconcile_duration(&self, aligned_sec: f64, probe: &ProbeResult) -> f64 {
        let check = self.config.duration_check;
        if !check.enabled || !probe.valid {
            return aligned_sec;
        }

        if (aligned_sec - probe.duration_sec).abs() > check.tolerance_sec {
            tracing::warn!(
                aligned_sec,
                probed_sec = probe.duration_sec,
                tolerance_sec = check.tolerance_sec,
                "Aligned duration disagrees with probe; reporting probed duration"
            );
            return probe.duration_sec;
        }
        aligned_sec
    }
}

struct StateTracker {
    state: PipelineState,
}

impl StateTracker {
    fn new() -> Self {
        tracing::debug!(state = %PipelineState::Fetching, "Pipeline started");
        Self {
            state: PipelineState::Fetching,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "Pipeline state transition");
        self.state = next;
    }

    fn fail(&mut self, error: PipelineError) -> PipelineError {
        tracing::debug!(from = %self.state, stage = %error.stage(), "Pipeline failing");
        self.advance(PipelineState::Failed);
        error
    }
}

fn log_finish<T>(run: &StateTracker, outcome: &Result<T, PipelineError>, started: Instant) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        Ok(_) => tracing::info!(state = %run.state, elapsed_ms, "Pipeline finished"),
        Err(e) => tracing::error!(
            state = %run.state,
            stage = %e.stage(),
            kind = e.kind(),
            error = %e,
            elapsed_ms,
            "Pipeline failed"
        ),
    }
}
