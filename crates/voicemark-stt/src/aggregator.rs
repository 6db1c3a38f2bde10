//! Backend fan-out and winner selection.
//!
//! One invocation runs every configured backend against the same
//! waveform, scores each transcript against the expected command
//! description, and selects the highest score. Per-backend failures
//! become absent results; only a total failure reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use voicemark_audio::Waveform;
use voicemark_foundation::{PipelineError, RecognitionError};

use crate::backend::SpeechBackend;
use crate::scoring::dice_score;
use crate::types::{ExpectedCommand, PipelineMetrics, ScoredResult, TranscriptionResult};

/// Everything one invocation produced: the winner plus the full
/// per-backend result set, in priority order.
#[derive(Debug, Clone)]
pub struct Recognition {
    pub winner: ScoredResult,
    pub results: Vec<TranscriptionResult>,
}

pub struct Aggregator {
    /// Priority order: index 0 wins score ties.
    backends: Vec<Arc<dyn SpeechBackend>>,
    timeout: Duration,
    metrics: Arc<PipelineMetrics>,
}

impl Aggregator {
    pub fn new(backends: Vec<Arc<dyn SpeechBackend>>, timeout: Duration) -> Self {
        Self {
            backends,
            timeout,
            metrics: Arc::new(PipelineMetrics::default()),
        }
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run all backends concurrently and pick the best-scoring
    /// transcript. Blocks until every backend finishes or times out.
    pub async fn transcribe(
        &self,
        waveform: &Waveform,
        expected: &ExpectedCommand,
    ) -> Result<Recognition, PipelineError> {
        self.metrics.record_invocation();

        if self.backends.is_empty() {
            self.metrics.record_aggregate_failure();
            return Err(PipelineError::NoTranscript { attempted: 0 });
        }

        let calls = self.backends.iter().map(|backend| {
            let backend = Arc::clone(backend);
            async move {
                let id = backend.info().id;
                match tokio::time::timeout(self.timeout, backend.recognize(waveform)).await {
                    Ok(Ok(text)) if !text.trim().is_empty() => {
                        TranscriptionResult::success(id, text)
                    }
                    Ok(Ok(_)) => {
                        TranscriptionResult::failure(id, RecognitionError::EmptyTranscript.to_string())
                    }
                    Ok(Err(e)) => TranscriptionResult::failure(id, e.to_string()),
                    Err(_) => TranscriptionResult::failure(
                        id,
                        RecognitionError::Timeout {
                            timeout_ms: self.timeout.as_millis() as u64,
                        }
                        .to_string(),
                    ),
                }
            }
        });

        let results = join_all(calls).await;

        for result in &results {
            if result.is_success() {
                self.metrics.record_backend_success();
            } else {
                self.metrics.record_backend_failure();
                warn!(
                    backend = %result.backend,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    command = %expected.tag,
                    "backend produced no transcript"
                );
            }
        }

        match self.select_winner(&results, expected) {
            Some(winner) => {
                debug!(
                    backend = %winner.backend,
                    score = winner.score,
                    command = %expected.tag,
                    "selected winning transcript"
                );
                Ok(Recognition { winner, results })
            }
            None => {
                self.metrics.record_aggregate_failure();
                Err(PipelineError::NoTranscript {
                    attempted: results.len(),
                })
            }
        }
    }

    /// Highest score wins; on a tie the backend earlier in the priority
    /// order wins. Results arrive in priority order, so a strictly
    /// greater comparison is exactly that tie-break.
    fn select_winner(
        &self,
        results: &[TranscriptionResult],
        expected: &ExpectedCommand,
    ) -> Option<ScoredResult> {
        let mut best: Option<ScoredResult> = None;

        for result in results {
            let Some(text) = result.text.as_deref() else {
                continue;
            };
            let score = dice_score(text, &expected.description);
            debug!(backend = %result.backend, score, "scored transcript");

            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(ScoredResult {
                    backend: result.backend.clone(),
                    text: text.to_string(),
                    score,
                });
            }
        }

        best
    }
}
