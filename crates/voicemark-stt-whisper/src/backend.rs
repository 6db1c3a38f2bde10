use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use voicemark_audio::Waveform;
use voicemark_foundation::RecognitionError;
use voicemark_stt::{BackendInfo, RecognitionConfig, SpeechBackend};

/// whisper.cpp backend. The context (weights) is built once at
/// initialization; each call creates its own decoding state, so
/// concurrent invocations never share mutable inference state.
pub struct WhisperBackend {
    ctx: Option<Arc<WhisperContext>>,
    language: String,
    beam_size: u32,
}

impl WhisperBackend {
    pub fn new() -> Self {
        Self {
            ctx: None,
            language: "ru".to_string(),
            beam_size: 5,
        }
    }
}

impl Default for WhisperBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WhisperBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperBackend")
            .field("model_loaded", &self.ctx.is_some())
            .field("language", &self.language)
            .field("beam_size", &self.beam_size)
            .finish()
    }
}

#[async_trait]
impl SpeechBackend for WhisperBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            id: "whisper".to_string(),
            name: "Whisper".to_string(),
            requires_network: false,
            is_local: true,
            supported_languages: vec!["ru".to_string(), "en".to_string()],
        }
    }

    async fn is_available(&self) -> Result<bool, RecognitionError> {
        Ok(self.ctx.is_some())
    }

    async fn initialize(&mut self, config: RecognitionConfig) -> Result<(), RecognitionError> {
        let model_path = if config.model_path.is_empty() {
            crate::default_model_path()
        } else {
            config.model_path.clone()
        };

        if !std::path::Path::new(&model_path).exists() {
            return Err(RecognitionError::ModelLoadFailed(format!(
                "Whisper model not found at '{model_path}'"
            )));
        }

        let ctx = WhisperContext::new_with_params(&model_path, WhisperContextParameters::default())
            .map_err(|e| RecognitionError::ModelLoadFailed(e.to_string()))?;

        info!(model = %model_path, "Whisper context created");
        self.ctx = Some(Arc::new(ctx));
        self.language = config.language;
        self.beam_size = config.beam_size;
        Ok(())
    }

    async fn recognize(&self, waveform: &Waveform) -> Result<String, RecognitionError> {
        let ctx = self
            .ctx
            .as_ref()
            .map(Arc::clone)
            .ok_or(RecognitionError::NotAvailable {
                reason: "Whisper backend not initialized".to_string(),
            })?;

        let samples = waveform.samples.clone();
        let language = self.language.clone();
        let beam_size = self.beam_size as usize;

        // Inference is heavily CPU-bound; run it on the blocking pool so
        // concurrent invocations' I/O is not starved.
        let text = tokio::task::spawn_blocking(move || {
            let mut float_samples = vec![0.0f32; samples.len()];
            whisper_rs::convert_integer_to_float_audio(&samples, &mut float_samples)
                .map_err(|e| RecognitionError::Backend(format!("sample conversion failed: {e}")))?;

            let mut params = FullParams::new(SamplingStrategy::BeamSearch {
                beam_size: beam_size as i32,
                patience: -1.0,
            });
            params.set_language(Some(&language));
            params.set_translate(false);
            params.set_print_special(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            let mut state = ctx
                .create_state()
                .map_err(|e| RecognitionError::Backend(format!("state creation failed: {e}")))?;
            state
                .full(params, &float_samples)
                .map_err(|e| RecognitionError::Backend(format!("inference failed: {e}")))?;

            let segments = state.full_n_segments();
            let mut parts = Vec::with_capacity(segments as usize);
            for i in 0..segments {
                let segment = state.get_segment(i).ok_or_else(|| {
                    RecognitionError::Backend(format!("segment {i} missing after inference"))
                })?;
                let text = segment.to_str().map_err(|e| {
                    RecognitionError::Backend(format!("segment {i} is not valid UTF-8: {e}"))
                })?;
                parts.push(text.trim().to_string());
            }
            Ok::<String, RecognitionError>(parts.join(" "))
        })
        .await
        .map_err(|e| RecognitionError::Backend(format!("recognition task failed: {e}")))??;

        debug!(chars = text.len(), "whisper transcript produced");
        if text.trim().is_empty() {
            return Err(RecognitionError::EmptyTranscript);
        }
        Ok(text)
    }
}
