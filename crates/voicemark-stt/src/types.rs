//! Core types for recognition and aggregation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// The command a recording is supposed to match.
///
/// Supplied by the caller per invocation and immutable for its duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedCommand {
    /// Unique short identifier, e.g. "cut_advance".
    pub tag: String,
    /// Free text the spoken command should match,
    /// e.g. "обрезать видео с 5 по 10 минуту".
    pub description: String,
}

impl ExpectedCommand {
    pub fn new(tag: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            description: description.into(),
        }
    }
}

/// Outcome of one backend for one invocation.
///
/// Exactly one of `text` / `error` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    pub backend: String,
    pub text: Option<String>,
    pub error: Option<String>,
}

impl TranscriptionResult {
    pub fn success(backend: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failure(backend: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            text: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.text.is_some()
    }
}

/// The winning transcript with its similarity score.
///
/// `text` is never empty: an invocation either produces a real winner or
/// an aggregate failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredResult {
    pub backend: String,
    pub text: String,
    /// Sørensen–Dice token-set similarity, 0..=100.
    pub score: u8,
}

/// Per-backend initialization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Recognition language (ISO 639-1).
    pub language: String,
    /// Model directory or file, empty for backends without local models.
    pub model_path: String,
    /// Sample rate of the waveforms this backend will be fed.
    pub sample_rate_hz: u32,
    /// Decoder beam size where the engine supports it.
    pub beam_size: u32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "ru".to_string(),
            model_path: String::new(),
            sample_rate_hz: voicemark_foundation::DEFAULT_SAMPLE_RATE_HZ,
            beam_size: 5,
        }
    }
}

/// Aggregator counters, shared across invocations.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    invocations: AtomicU64,
    backend_successes: AtomicU64,
    backend_failures: AtomicU64,
    aggregate_failures: AtomicU64,
}

impl PipelineMetrics {
    pub fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_success(&self) {
        self.backend_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_failure(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_aggregate_failure(&self) {
        self.aggregate_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations: self.invocations.load(Ordering::Relaxed),
            backend_successes: self.backend_successes.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
            aggregate_failures: self.aggregate_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub invocations: u64,
    pub backend_successes: u64,
    pub backend_failures: u64,
    pub aggregate_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_result_constructors() {
        let ok = TranscriptionResult::success("vosk", "обрезать видео");
        assert!(ok.is_success());
        assert!(ok.error.is_none());

        let err = TranscriptionResult::failure("gcloud", "network unreachable");
        assert!(!err.is_success());
        assert!(err.text.is_none());
    }

    #[test]
    fn metrics_snapshot_counts() {
        let m = PipelineMetrics::default();
        m.record_invocation();
        m.record_backend_success();
        m.record_backend_failure();
        m.record_backend_failure();
        let snap = m.snapshot();
        assert_eq!(snap.invocations, 1);
        assert_eq!(snap.backend_successes, 1);
        assert_eq!(snap.backend_failures, 2);
        assert_eq!(snap.aggregate_failures, 0);
    }
}
