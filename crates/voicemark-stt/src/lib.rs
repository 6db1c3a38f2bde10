//! Recognition core for Voicemark.
//!
//! Defines the backend abstraction every speech-to-text engine
//! implements, the token-set similarity scoring, and the aggregator that
//! fans a waveform out to all configured backends and picks the best
//! transcript.

pub mod aggregator;
pub mod backend;
pub mod backends;
pub mod pipeline;
pub mod scoring;
pub mod types;

pub use aggregator::{Aggregator, Recognition};
pub use backend::{BackendFactory, BackendInfo, BackendRegistry, SpeechBackend};
pub use pipeline::Pipeline;
pub use types::{
    ExpectedCommand, MetricsSnapshot, PipelineMetrics, RecognitionConfig, ScoredResult,
    TranscriptionResult,
};
