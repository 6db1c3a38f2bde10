//! whisper.cpp backend for Voicemark.
//!
//! Highest-accuracy local backend, at the cost of model size and
//! inference time. Compiled against whisper.cpp only when the `whisper`
//! feature is enabled; otherwise the factory registers a stub that
//! reports the backend as unavailable.

#[cfg(feature = "whisper")]
mod backend;

#[cfg(feature = "whisper")]
pub use backend::WhisperBackend;

use voicemark_foundation::RecognitionError;
use voicemark_stt::{BackendFactory, BackendInfo, SpeechBackend};

/// Default ggml model file.
pub fn default_model_path() -> String {
    std::env::var("WHISPER_MODEL_PATH").unwrap_or_else(|_| "models/whisper/ggml-small.bin".to_string())
}

fn backend_info() -> BackendInfo {
    BackendInfo {
        id: "whisper".to_string(),
        name: "Whisper".to_string(),
        requires_network: false,
        is_local: true,
        supported_languages: vec!["ru".to_string(), "en".to_string()],
    }
}

#[derive(Default)]
pub struct WhisperBackendFactory;

impl WhisperBackendFactory {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "whisper")]
impl BackendFactory for WhisperBackendFactory {
    fn create(&self) -> Result<Box<dyn SpeechBackend>, RecognitionError> {
        Ok(Box::new(WhisperBackend::new()))
    }

    fn backend_info(&self) -> BackendInfo {
        backend_info()
    }

    fn check_requirements(&self) -> Result<(), RecognitionError> {
        let path = default_model_path();
        if !std::path::Path::new(&path).exists() {
            return Err(RecognitionError::NotAvailable {
                reason: format!("Whisper model not found at '{path}'"),
            });
        }
        Ok(())
    }
}

#[cfg(not(feature = "whisper"))]
impl BackendFactory for WhisperBackendFactory {
    fn create(&self) -> Result<Box<dyn SpeechBackend>, RecognitionError> {
        Err(RecognitionError::NotAvailable {
            reason: "built without whisper support".to_string(),
        })
    }

    fn backend_info(&self) -> BackendInfo {
        backend_info()
    }

    fn check_requirements(&self) -> Result<(), RecognitionError> {
        Err(RecognitionError::NotAvailable {
            reason: "built without whisper support".to_string(),
        })
    }
}

#[cfg(all(test, not(feature = "whisper")))]
mod tests {
    use super::*;

    #[test]
    fn stub_factory_reports_unavailable() {
        let factory = WhisperBackendFactory::new();
        assert_eq!(factory.backend_info().id, "whisper");
        assert!(factory.check_requirements().is_err());
        assert!(factory.create().is_err());
    }
}
