//! Audio acquisition and normalization for the Voicemark pipeline.
//!
//! A voice clip arrives as a compressed container (OGG/Opus from the
//! messaging platform), is downloaded to a per-invocation temp file, and
//! is normalized once into a 16 kHz mono PCM waveform that all
//! recognition backends share.

pub mod clip;
pub mod fetch;
pub mod normalizer;
pub mod resampler;
pub mod waveform;

pub use clip::VoiceClip;
pub use fetch::fetch_clip;
pub use normalizer::{Normalizer, NormalizerConfig};
pub use waveform::Waveform;
