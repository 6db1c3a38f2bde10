use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use vosk::{CompleteResult, Model, Recognizer};

use voicemark_audio::Waveform;
use voicemark_foundation::RecognitionError;
use voicemark_stt::{BackendInfo, RecognitionConfig, SpeechBackend};

/// Vosk-based backend. The model is loaded once at initialization and
/// shared read-only; a fresh `Recognizer` is built per call, which keeps
/// concurrent invocations independent.
#[derive(Default)]
pub struct VoskBackend {
    model: Option<Arc<Model>>,
    sample_rate_hz: u32,
}

impl VoskBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for VoskBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoskBackend")
            .field("model_loaded", &self.model.is_some())
            .field("sample_rate_hz", &self.sample_rate_hz)
            .finish()
    }
}

#[async_trait]
impl SpeechBackend for VoskBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            id: "vosk".to_string(),
            name: "Vosk".to_string(),
            requires_network: false,
            is_local: true,
            supported_languages: vec!["ru".to_string(), "en".to_string()],
        }
    }

    async fn is_available(&self) -> Result<bool, RecognitionError> {
        Ok(self.model.is_some())
    }

    async fn initialize(&mut self, config: RecognitionConfig) -> Result<(), RecognitionError> {
        let model_path = if config.model_path.is_empty() {
            crate::default_model_path()
        } else {
            config.model_path.clone()
        };

        if !std::path::Path::new(&model_path).exists() {
            return Err(RecognitionError::ModelLoadFailed(format!(
                "Vosk model not found at '{model_path}'"
            )));
        }

        // Vosk models are recorded at 16 kHz; anything else degrades
        // recognition quality.
        if config.sample_rate_hz != 16_000 {
            warn!(
                rate = config.sample_rate_hz,
                "sample rate differs from the expected 16000 Hz, recognition quality may suffer"
            );
        }

        let model = Model::new(&model_path).ok_or_else(|| {
            RecognitionError::ModelLoadFailed(format!("failed to load Vosk model from '{model_path}'"))
        })?;

        debug!(model = %model_path, "Vosk model loaded");
        self.model = Some(Arc::new(model));
        self.sample_rate_hz = config.sample_rate_hz;
        Ok(())
    }

    async fn recognize(&self, waveform: &Waveform) -> Result<String, RecognitionError> {
        let model = self
            .model
            .as_ref()
            .map(Arc::clone)
            .ok_or(RecognitionError::NotAvailable {
                reason: "Vosk backend not initialized".to_string(),
            })?;

        let samples = waveform.samples.clone();
        let sample_rate = waveform.sample_rate_hz as f32;

        // Decoding is CPU-bound; keep it off the async threads.
        let text = tokio::task::spawn_blocking(move || {
            let mut recognizer = Recognizer::new(&model, sample_rate).ok_or_else(|| {
                RecognitionError::Backend("failed to create Vosk recognizer".to_string())
            })?;
            recognizer.set_words(false);

            recognizer
                .accept_waveform(&samples)
                .map_err(|e| RecognitionError::Backend(format!("waveform rejected: {e:?}")))?;

            match recognizer.final_result() {
                CompleteResult::Single(single) => Ok(single.text.to_string()),
                CompleteResult::Multiple(multiple) => Ok(multiple
                    .alternatives
                    .first()
                    .map(|a| a.text.to_string())
                    .unwrap_or_default()),
            }
        })
        .await
        .map_err(|e| RecognitionError::Backend(format!("recognition task failed: {e}")))??;

        if text.trim().is_empty() {
            return Err(RecognitionError::EmptyTranscript);
        }
        Ok(text)
    }
}
