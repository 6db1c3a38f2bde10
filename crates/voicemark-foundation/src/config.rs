//! Pipeline configuration.
//!
//! Loaded from a TOML file with environment overrides (`VOICEMARK_`
//! prefix), then handed read-only to the audio and recognition layers.

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PipelineError;

/// Target sample rate for normalized waveforms.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;

/// Default per-backend timeout applied by the aggregator.
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Recognition language (ISO 639-1, e.g. "ru").
    pub language: String,

    /// Enabled backends, in priority order. The order is the tie-break:
    /// on equal similarity scores the backend listed first wins.
    pub backends: Vec<String>,

    /// Per-backend timeout in milliseconds. A backend that exceeds it is
    /// recorded as failed; the others still count.
    pub backend_timeout_ms: u64,

    /// Normalized waveform sample rate. Backends are fed mono PCM at
    /// this rate.
    pub sample_rate_hz: u32,

    #[serde(default)]
    pub vosk: VoskConfig,

    #[serde(default)]
    pub whisper: WhisperConfig,

    #[serde(default)]
    pub gcloud: GcloudConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoskConfig {
    /// Path to the unpacked Vosk model directory.
    pub model_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Path to a ggml model file.
    pub model_path: Option<String>,

    /// Beam size for decoding.
    pub beam_size: u32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            beam_size: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcloudConfig {
    /// Environment variable holding the API key. The key itself never
    /// lives in the config file.
    pub api_key_env: String,
}

impl Default for GcloudConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GCLOUD_SPEECH_API_KEY".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "ru".to_string(),
            backends: vec![
                "whisper".to_string(),
                "vosk".to_string(),
                "gcloud".to_string(),
            ],
            backend_timeout_ms: DEFAULT_BACKEND_TIMEOUT_MS,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            vosk: VoskConfig::default(),
            whisper: WhisperConfig::default(),
            gcloud: GcloudConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file, overlaying `VOICEMARK_*`
    /// environment variables. Missing file falls back to defaults.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("VOICEMARK").separator("__"));

        let loaded: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.backends.is_empty() {
            return Err(PipelineError::Config(
                "at least one backend must be enabled".to_string(),
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err(PipelineError::Config(
                "sample_rate_hz must be non-zero".to_string(),
            ));
        }
        if self.backend_timeout_ms == 0 {
            return Err(PipelineError::Config(
                "backend_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
