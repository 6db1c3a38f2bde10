//! End-to-end pipeline tests with mock backends.

use std::sync::Arc;
use std::time::Duration;

use voicemark_audio::{Normalizer, NormalizerConfig, VoiceClip, Waveform};
use voicemark_foundation::PipelineError;
use voicemark_stt::backends::mock::MockBackend;
use voicemark_stt::{Aggregator, ExpectedCommand, Pipeline, SpeechBackend};

fn pipeline(backends: Vec<Arc<dyn SpeechBackend>>) -> Pipeline {
    Pipeline::new(
        Normalizer::new(NormalizerConfig::default()),
        Aggregator::new(backends, Duration::from_secs(5)),
    )
}

fn waveform() -> Waveform {
    Waveform::new(vec![0i16; 16_000], 16_000)
}

#[tokio::test]
async fn best_match_wins_end_to_end() {
    // Two backends disagree on the transcript; the one closer to the
    // expected description must win.
    let expected = ExpectedCommand::new("cut_advance", "обрезать видео с 5 по 10 минуту");
    let p = pipeline(vec![
        Arc::new(MockBackend::with_transcript("whisper", "обрезать видео")),
        Arc::new(MockBackend::with_transcript("vosk", "обрезать видеоролик")),
    ]);

    let recognition = p.run_waveform(&waveform(), &expected).await.unwrap();
    assert_eq!(recognition.winner.backend, "whisper");
    assert_eq!(recognition.winner.text, "обрезать видео");
    assert!(recognition.winner.score > 0);
    assert!(!recognition.winner.text.is_empty());
}

#[tokio::test]
async fn surviving_backend_wins_when_other_errors() {
    // Backend A throws a network error; B's transcript must be returned
    // with A's failure recorded, not raised.
    let expected = ExpectedCommand::new("add_subtitles", "вставить титры");
    let p = pipeline(vec![
        Arc::new(MockBackend::with_error("gcloud", "network error")),
        Arc::new(MockBackend::with_transcript("vosk", "вставить титры")),
    ]);

    let recognition = p.run_waveform(&waveform(), &expected).await.unwrap();
    assert_eq!(recognition.winner.backend, "vosk");
    assert_eq!(recognition.winner.score, 100);
    assert_eq!(recognition.results.len(), 2);
    assert!(!recognition.results[0].is_success());
}

#[tokio::test]
async fn whisper_only_configuration_uses_same_algorithm() {
    // Degraded single-backend deployment is a one-element priority
    // list, not a separate code path.
    let expected = ExpectedCommand::new("add_music", "наложить музыку");
    let p = pipeline(vec![Arc::new(MockBackend::with_transcript(
        "whisper",
        "наложить музыку",
    ))]);

    let recognition = p.run_waveform(&waveform(), &expected).await.unwrap();
    assert_eq!(recognition.winner.backend, "whisper");
    assert_eq!(recognition.winner.score, 100);
    assert_eq!(recognition.results.len(), 1);
}

#[tokio::test]
async fn total_failure_is_an_error_never_a_blank_winner() {
    let expected = ExpectedCommand::new("x", "обрезать видео");
    let p = pipeline(vec![
        Arc::new(MockBackend::with_error("a", "model unavailable")),
        Arc::new(MockBackend::with_transcript("b", "")),
    ]);

    let err = p.run_waveform(&waveform(), &expected).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoTranscript { attempted: 2 }));
}

#[tokio::test]
async fn owned_clip_is_deleted_even_when_conversion_fails() {
    // Point the normalizer at a transcoder that cannot exist so the
    // pipeline fails before recognition; the temp file must still be
    // cleaned up when the clip is dropped.
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"not really ogg").unwrap();
    let path = file.path().to_path_buf();
    let clip = VoiceClip::owned(file.into_temp_path());

    let p = Pipeline::new(
        Normalizer::new(NormalizerConfig {
            ffmpeg_bin: "/nonexistent/transcoder".to_string(),
            ..Default::default()
        }),
        Aggregator::new(
            vec![Arc::new(MockBackend::with_transcript("m", "текст"))],
            Duration::from_secs(1),
        ),
    );

    let expected = ExpectedCommand::new("x", "текст");
    let result = p.run(&clip, &expected).await;
    assert!(matches!(result, Err(PipelineError::Conversion(_))));

    assert!(path.exists(), "clip must outlive the failed invocation");
    drop(clip);
    assert!(!path.exists(), "temp file must be gone after drop");
}

#[tokio::test]
async fn concurrent_invocations_share_backends_safely() {
    let expected = ExpectedCommand::new("x", "вставить титры");
    let backend: Arc<dyn SpeechBackend> =
        Arc::new(MockBackend::with_transcript("m", "вставить титры"));
    let p = Arc::new(pipeline(vec![backend]));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let p = Arc::clone(&p);
        let expected = expected.clone();
        handles.push(tokio::spawn(async move {
            p.run_waveform(&waveform(), &expected).await
        }));
    }

    for handle in handles {
        let recognition = handle.await.unwrap().unwrap();
        assert_eq!(recognition.winner.score, 100);
    }

    let snap = p.aggregator().metrics().snapshot();
    assert_eq!(snap.invocations, 8);
    assert_eq!(snap.backend_successes, 8);
}
