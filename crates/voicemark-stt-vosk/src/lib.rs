//! Vosk backend for Voicemark.
//!
//! Local, offline recognition with a small footprint. Compiled against
//! libvosk only when the `vosk` feature is enabled; without it the
//! factory still registers and reports the backend as unavailable, so a
//! configuration listing "vosk" degrades gracefully.

#[cfg(feature = "vosk")]
mod backend;

#[cfg(feature = "vosk")]
pub use backend::VoskBackend;

use voicemark_foundation::RecognitionError;
use voicemark_stt::{BackendFactory, BackendInfo, SpeechBackend};

/// Default location of the unpacked model directory.
pub fn default_model_path() -> String {
    std::env::var("VOSK_MODEL_PATH").unwrap_or_else(|_| "models/vosk-model-small-ru-0.22".to_string())
}

fn backend_info() -> BackendInfo {
    BackendInfo {
        id: "vosk".to_string(),
        name: "Vosk".to_string(),
        requires_network: false,
        is_local: true,
        supported_languages: vec!["ru".to_string(), "en".to_string()],
    }
}

#[derive(Default)]
pub struct VoskBackendFactory;

impl VoskBackendFactory {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "vosk")]
impl BackendFactory for VoskBackendFactory {
    fn create(&self) -> Result<Box<dyn SpeechBackend>, RecognitionError> {
        Ok(Box::new(VoskBackend::new()))
    }

    fn backend_info(&self) -> BackendInfo {
        backend_info()
    }

    fn check_requirements(&self) -> Result<(), RecognitionError> {
        let path = default_model_path();
        if !std::path::Path::new(&path).exists() {
            return Err(RecognitionError::NotAvailable {
                reason: format!("Vosk model not found at '{path}'"),
            });
        }
        Ok(())
    }
}

#[cfg(not(feature = "vosk"))]
impl BackendFactory for VoskBackendFactory {
    fn create(&self) -> Result<Box<dyn SpeechBackend>, RecognitionError> {
        Err(RecognitionError::NotAvailable {
            reason: "built without vosk support".to_string(),
        })
    }

    fn backend_info(&self) -> BackendInfo {
        backend_info()
    }

    fn check_requirements(&self) -> Result<(), RecognitionError> {
        Err(RecognitionError::NotAvailable {
            reason: "built without vosk support".to_string(),
        })
    }
}

#[cfg(all(test, not(feature = "vosk")))]
mod tests {
    use super::*;

    #[test]
    fn stub_factory_reports_unavailable() {
        let factory = VoskBackendFactory::new();
        assert_eq!(factory.backend_info().id, "vosk");
        assert!(factory.check_requirements().is_err());
        assert!(factory.create().is_err());
    }
}
