use thiserror::Error;

/// Top-level pipeline error.
///
/// Per-backend failures never surface here; they are folded into absent
/// results by the aggregator. Only a total failure (no usable transcript)
/// or a failure that blocks every backend reaches the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Clip download failed: {0}")]
    Fetch(String),

    #[error("No transcript available: all {attempted} backend(s) failed or returned empty text")]
    NoTranscript { attempted: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Format normalization failed. Non-retryable for this invocation; the
/// clip itself is the problem or the transcoder is unusable.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Transcoder not found: {0}")]
    TranscoderMissing(String),

    #[error("Transcoder exited with failure: {0}")]
    TranscoderFailed(String),

    #[error("Malformed waveform output: {0}")]
    BadWav(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
}

/// A single recognition backend failed.
///
/// Always recoverable at the call site: the aggregator records the failure
/// and keeps going with the remaining backends.
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Backend not available: {reason}")]
    NotAvailable { reason: String },

    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned no text")]
    EmptyTranscript,

    #[error("Backend timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl RecognitionError {
    /// Whether the failure happened before any audio was processed
    /// (initialization), as opposed to a per-call recognition failure.
    pub fn is_init_failure(&self) -> bool {
        matches!(
            self,
            RecognitionError::NotAvailable { .. } | RecognitionError::ModelLoadFailed(_)
        )
    }
}
