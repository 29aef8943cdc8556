use std::sync::Arc;
use std::time::Duration;

use audioscribe::application::ports::{EngineError, ProbeError};
use audioscribe::application::services::{
    DurationCrossCheck, IngestionError, PipelineConfig, PipelineError, PipelineOutcome,
    StageTimeouts, TranscriptionRequest,
};
use audioscribe::domain::{AudioSource, FailedStage, ProbeResult};

use crate::helpers::{
    CountingStore, EngineScript, Harness, StubFetcher, StubProber, TEST_QUOTA_BYTES, probe,
};

fn upload(name: &str) -> TranscriptionRequest {
    TranscriptionRequest::new(AudioSource::upload(vec![0u8; 2048], Some(name.to_string())))
}

fn remote(url: &str) -> TranscriptionRequest {
    TranscriptionRequest::new(AudioSource::remote(url))
}

fn wav_probe(duration_sec: f64) -> ProbeResult {
    ProbeResult {
        container_format: Some("wav".to_string()),
        ..probe(duration_sec, 16_000, "pcm_s16le")
    }
}

#[tokio::test]
async fn given_clean_wav_upload_when_run_then_transcript_without_warnings() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(wav_probe(10.0)),
        EngineScript {
            aligned_duration_sec: Some(10.0),
            ..EngineScript::default()
        },
    );

    let outcome = harness.pipeline.run(upload("speech.wav")).await.unwrap();

    let PipelineOutcome::Transcribed { result, warnings } = outcome else {
        panic!("expected transcript, got {:?}", outcome);
    };
    assert!(warnings.is_empty());
    assert!(!result.segments.is_empty());
    assert_eq!(result.language, "en");
    assert!((result.total_duration_sec - 10.0).abs() < 0.01);
    assert_eq!(result.full_text, "Hello world. This is a test.");
    assert_eq!(harness.store.delete_count(), 1);
    assert_eq!(harness.leftover_files(), 0);
}

#[tokio::test]
async fn given_language_hint_when_run_then_hint_reaches_engine() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript::default(),
    );
    let mut request = upload("a.mp3");
    request.language = Some("de".to_string());

    let outcome = harness.pipeline.run(request).await.unwrap();

    match outcome {
        PipelineOutcome::Transcribed { result, .. } => assert_eq!(result.language, "de"),
        other => panic!("expected transcript, got {:?}", other),
    }
}

#[tokio::test]
async fn given_404_url_when_run_then_fails_at_ingest_and_still_releases() {
    let harness = Harness::new(
        StubFetcher::status(404),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript::default(),
    );

    let error = harness
        .pipeline
        .run(remote("https://example.com/missing.mp3"))
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::Ingest(IngestionError::Network(_))));
    assert_eq!(error.stage(), FailedStage::Ingest);
    assert_eq!(error.kind(), "network");
    assert_eq!(harness.prober.calls(), 0);
    assert_eq!(harness.engine.transcribe_count(), 0);
    assert_eq!(harness.store.delete_count(), 1);
}

#[tokio::test]
async fn given_ninety_minute_file_when_run_then_rejected_without_engine() {
    let harness = Harness::new(
        StubFetcher::body(vec![1u8; 4096]),
        StubProber::returning(probe(5400.0, 44_100, "mp3")),
        EngineScript::default(),
    );

    let outcome = harness
        .pipeline
        .run(remote("https://example.com/lecture.mp3"))
        .await
        .unwrap();

    let PipelineOutcome::Rejected(verdict) = outcome else {
        panic!("expected rejection, got {:?}", outcome);
    };
    assert!(!verdict.passed);
    assert_eq!(verdict.errors, vec!["audio too long: 5400s > 3600s".to_string()]);
    assert_eq!(harness.engine.transcriber_load_count(), 0);
    assert_eq!(harness.engine.transcribe_count(), 0);
    assert_eq!(harness.store.delete_count(), 1);
    assert_eq!(harness.leftover_files(), 0);
}

#[tokio::test]
async fn given_probe_tool_failure_when_run_then_rejected_as_invalid_and_engine_never_called() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::failing(|| ProbeError::ToolFailed("exit status: 1".to_string())),
        EngineScript::default(),
    );

    let outcome = harness.pipeline.run(upload("junk.bin")).await.unwrap();

    let PipelineOutcome::Rejected(verdict) = outcome else {
        panic!("expected rejection, got {:?}", outcome);
    };
    assert!(verdict.errors.contains(&"invalid audio file".to_string()));
    assert_eq!(harness.engine.transcribe_count(), 0);
    assert_eq!(harness.store.delete_count(), 1);
}

#[tokio::test]
async fn given_zero_duration_when_run_then_rejected_as_too_short() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(0.0, 44_100, "mp3")),
        EngineScript::default(),
    );

    let outcome = harness.pipeline.run(upload("empty.mp3")).await.unwrap();

    match outcome {
        PipelineOutcome::Rejected(verdict) => {
            assert_eq!(verdict.errors, vec!["audio too short: 0s < 1s".to_string()]);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(harness.engine.transcribe_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn given_hanging_probe_when_run_then_timeout_becomes_invalid_audio() {
    let harness = Harness::with_config(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")).slow(Duration::from_secs(60)),
        EngineScript::default(),
        PipelineConfig {
            timeouts: StageTimeouts {
                probe: Duration::from_secs(1),
                ..StageTimeouts::default()
            },
            ..PipelineConfig::default()
        },
    );

    let outcome = harness.pipeline.run(upload("slow.mp3")).await.unwrap();

    assert!(matches!(outcome, PipelineOutcome::Rejected(_)));
    assert_eq!(harness.store.delete_count(), 1);
}

#[tokio::test]
async fn given_low_sample_rate_when_run_then_transcript_carries_warning() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 4_000, "mp3")),
        EngineScript::default(),
    );

    let outcome = harness.pipeline.run(upload("phone.mp3")).await.unwrap();

    match outcome {
        PipelineOutcome::Transcribed { warnings, .. } => {
            assert_eq!(warnings, vec!["low sample rate: 4000Hz < 8000Hz".to_string()]);
        }
        other => panic!("expected transcript, got {:?}", other),
    }
}

#[tokio::test]
async fn given_model_load_failure_when_run_then_fails_at_transcribe() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript {
            load_error: Some(EngineError::ModelLoadFailed("no weights".to_string())),
            ..EngineScript::default()
        },
    );

    let error = harness.pipeline.run(upload("a.mp3")).await.unwrap_err();

    assert_eq!(error.stage(), FailedStage::Transcribe);
    assert_eq!(error.kind(), "model_load_failed");
    assert_eq!(harness.store.delete_count(), 1);
    assert_eq!(harness.leftover_files(), 0);
}

#[tokio::test]
async fn given_inference_failure_when_run_then_fails_at_transcribe_without_alignment() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript {
            transcribe_error: Some(EngineError::InferenceFailed("cuda oom".to_string())),
            ..EngineScript::default()
        },
    );

    let error = harness.pipeline.run(upload("a.mp3")).await.unwrap_err();

    assert!(matches!(error, PipelineError::Transcribe(EngineError::InferenceFailed(_))));
    assert_eq!(harness.engine.align_count(), 0);
    assert_eq!(harness.store.delete_count(), 1);
}

#[tokio::test]
async fn given_alignment_failure_when_run_then_fails_at_align() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript {
            align_error: Some(EngineError::InferenceFailed("no alignment model".to_string())),
            ..EngineScript::default()
        },
    );

    let error = harness.pipeline.run(upload("a.mp3")).await.unwrap_err();

    assert_eq!(error.stage(), FailedStage::Align);
    assert_eq!(harness.engine.transcribe_count(), 1);
    assert_eq!(harness.store.delete_count(), 1);
    assert_eq!(harness.leftover_files(), 0);
}

#[tokio::test(start_paused = true)]
async fn given_slow_engine_when_run_then_transcribe_timeout() {
    let harness = Harness::with_config(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript {
            transcribe_delay: Duration::from_secs(120),
            ..EngineScript::default()
        },
        PipelineConfig {
            timeouts: StageTimeouts {
                transcribe: Duration::from_secs(5),
                ..StageTimeouts::default()
            },
            ..PipelineConfig::default()
        },
    );

    let error = harness.pipeline.run(upload("a.mp3")).await.unwrap_err();

    assert!(matches!(error, PipelineError::Transcribe(EngineError::Timeout(_))));
    assert_eq!(error.kind(), "timeout");
    assert_eq!(harness.store.delete_count(), 1);
}

#[tokio::test]
async fn given_oversized_upload_when_run_then_fails_too_large() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript::default(),
    );
    let big = vec![0u8; (TEST_QUOTA_BYTES + 1) as usize];

    let error = harness
        .pipeline
        .run(TranscriptionRequest::new(AudioSource::upload(big, None)))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "too_large");
    assert_eq!(harness.prober.calls(), 0);
    assert_eq!(harness.store.delete_count(), 1);
}

#[tokio::test]
async fn given_failing_cleanup_when_run_then_outcome_is_unaffected() {
    let scratch = tempfile::TempDir::new().unwrap();
    let store = Arc::new(CountingStore::failing_deletes(scratch.path()));
    let harness = Harness::assemble(
        scratch,
        store,
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript::default(),
        PipelineConfig::default(),
    );

    let outcome = harness.pipeline.run(upload("a.mp3")).await;

    assert!(matches!(outcome, Ok(PipelineOutcome::Transcribed { .. })));
    assert_eq!(harness.store.delete_count(), 1);
}

#[tokio::test]
async fn given_cancelled_run_when_dropped_mid_transcription_then_scratch_is_released() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript {
            transcribe_delay: Duration::from_secs(30),
            ..EngineScript::default()
        },
    );

    let run = harness.pipeline.run(upload("a.mp3"));
    let cancelled = tokio::time::timeout(Duration::from_millis(100), run).await;
    assert!(cancelled.is_err());

    for _ in 0..50 {
        if harness.store.delete_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(harness.engine.transcribe_count(), 1);
    assert_eq!(harness.store.delete_count(), 1);
    assert_eq!(harness.leftover_files(), 0);
}

#[tokio::test]
async fn given_cross_check_enabled_when_alignment_drifts_then_probed_duration_wins() {
    let harness = Harness::with_config(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript {
            aligned_duration_sec: Some(42.0),
            ..EngineScript::default()
        },
        PipelineConfig {
            duration_check: DurationCrossCheck {
                enabled: true,
                tolerance_sec: 1.0,
            },
            ..PipelineConfig::default()
        },
    );

    let outcome = harness.pipeline.run(upload("a.mp3")).await.unwrap();

    match outcome {
        PipelineOutcome::Transcribed { result, .. } => assert_eq!(result.total_duration_sec, 30.0),
        other => panic!("expected transcript, got {:?}", other),
    }
}

#[tokio::test]
async fn given_cross_check_disabled_when_alignment_drifts_then_aligned_duration_is_kept() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript {
            aligned_duration_sec: Some(42.0),
            ..EngineScript::default()
        },
    );

    let outcome = harness.pipeline.run(upload("a.mp3")).await.unwrap();

    match outcome {
        PipelineOutcome::Transcribed { result, .. } => assert_eq!(result.total_duration_sec, 42.0),
        other => panic!("expected transcript, got {:?}", other),
    }
}

#[tokio::test]
async fn given_repeated_runs_when_transcribing_then_model_is_loaded_once() {
    let harness = Harness::new(
        StubFetcher::status(500),
        StubProber::returning(probe(30.0, 44_100, "mp3")),
        EngineScript::default(),
    );

    for _ in 0..3 {
        harness.pipeline.run(upload("a.mp3")).await.unwrap();
    }

    assert_eq!(harness.engine.transcriber_load_count(), 1);
    assert_eq!(harness.engine.transcribe_count(), 3);
    assert_eq!(harness.store.delete_count(), 3);
}

#[tokio::test]
async fn given_inspection_when_run_then_probe_and_verdict_without_engine() {
    let harness = Harness::new(
        StubFetcher::body(vec![9u8; 512]),
        StubProber::returning(probe(12.0, 22_050, "flac")),
        EngineScript::default(),
    );

    let inspection = harness
        .pipeline
        .inspect(AudioSource::remote("https://example.com/a.flac"))
        .await
        .unwrap();

    assert_eq!(inspection.probe.duration_sec, 12.0);
    assert!(inspection.verdict.passed);
    assert_eq!(harness.engine.transcriber_load_count(), 0);
    assert_eq!(harness.store.delete_count(), 1);
    assert_eq!(harness.leftover_files(), 0);
}

#[tokio::test]
async fn given_inspection_of_bad_url_when_run_then_invalid_url_failure() {
    let harness = Harness::new(
        StubFetcher::body(vec![9u8; 512]),
        StubProber::returning(probe(12.0, 22_050, "flac")),
        EngineScript::default(),
    );

    let error = harness
        .pipeline
        .inspect(AudioSource::remote("s3://bucket/a.flac"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "invalid_url");
    assert_eq!(harness.store.delete_count(), 1);
}
