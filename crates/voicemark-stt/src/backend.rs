//! Backend abstraction.
//!
//! Every speech-to-text engine (Vosk, whisper, cloud APIs) implements
//! [`SpeechBackend`]. Backends are constructed through factories and
//! resolved into a priority-ordered set by the [`BackendRegistry`].

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{info, warn};

use voicemark_audio::Waveform;
use voicemark_foundation::RecognitionError;

use crate::types::RecognitionConfig;

/// Metadata about a backend.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Unique identifier, e.g. "vosk", "whisper", "gcloud".
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether recognition requires network access.
    pub requires_network: bool,
    /// Whether audio is processed locally.
    pub is_local: bool,
    /// Supported languages (ISO 639-1 codes).
    pub supported_languages: Vec<String>,
}

/// A single speech-to-text engine.
///
/// Expensive state (model, HTTP client) is built once in `initialize`;
/// `recognize` is stateless per call and safe to run from concurrent
/// invocations, which is why it takes `&self`.
#[async_trait]
pub trait SpeechBackend: Send + Sync + Debug {
    fn info(&self) -> BackendInfo;

    /// Whether the backend can be used right now (model on disk, API key
    /// present, ...).
    async fn is_available(&self) -> Result<bool, RecognitionError>;

    /// One-time setup. Failure here is an initialization failure,
    /// distinct from a per-call recognition failure: the registry logs
    /// it and excludes the backend for the process lifetime.
    async fn initialize(&mut self, config: RecognitionConfig) -> Result<(), RecognitionError>;

    /// Transcribe a normalized waveform (16 kHz mono PCM).
    async fn recognize(&self, waveform: &Waveform) -> Result<String, RecognitionError>;
}

/// Creates backend instances without initializing them.
pub trait BackendFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn SpeechBackend>, RecognitionError>;

    fn backend_info(&self) -> BackendInfo;

    /// Cheap preflight: are the backend's requirements met on this host?
    fn check_requirements(&self) -> Result<(), RecognitionError>;
}

/// Holds registered factories and resolves the configured priority list
/// into live, initialized backends.
#[derive(Default)]
pub struct BackendRegistry {
    factories: Vec<Box<dyn BackendFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Box<dyn BackendFactory>) {
        self.factories.push(factory);
    }

    /// Info for every registered backend, with availability filled in.
    pub fn registered(&self) -> Vec<(BackendInfo, bool)> {
        self.factories
            .iter()
            .map(|f| {
                let available = f.check_requirements().is_ok();
                (f.backend_info(), available)
            })
            .collect()
    }

    /// Build and initialize the backends named in `order`, preserving
    /// that order (it is the aggregator's tie-break). A backend that is
    /// unknown, fails its requirements check, or fails to initialize is
    /// logged and skipped; recognition continues with the rest.
    pub async fn resolve<F>(
        &self,
        order: &[String],
        config_for: F,
    ) -> Vec<Arc<dyn SpeechBackend>>
    where
        F: Fn(&str) -> RecognitionConfig,
    {
        let mut resolved: Vec<Arc<dyn SpeechBackend>> = Vec::with_capacity(order.len());

        for id in order {
            let factory = match self.factories.iter().find(|f| &f.backend_info().id == id) {
                Some(f) => f,
                None => {
                    warn!(backend = %id, "configured backend is not registered, skipping");
                    continue;
                }
            };

            if let Err(e) = factory.check_requirements() {
                warn!(backend = %id, error = %e, "backend requirements not met, skipping");
                continue;
            }

            let mut backend = match factory.create() {
                Ok(b) => b,
                Err(e) => {
                    warn!(backend = %id, error = %e, "backend construction failed, skipping");
                    continue;
                }
            };

            match backend.initialize(config_for(id)).await {
                Ok(()) => {
                    info!(backend = %id, "backend initialized");
                    resolved.push(Arc::from(backend));
                }
                Err(e) => {
                    warn!(backend = %id, error = %e, "backend initialization failed, skipping");
                }
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockBackendFactory;

    #[tokio::test]
    async fn resolve_preserves_configured_order() {
        let mut registry = BackendRegistry::new();
        registry.register(Box::new(MockBackendFactory::with_id("beta")));
        registry.register(Box::new(MockBackendFactory::with_id("alpha")));

        let order = vec!["alpha".to_string(), "beta".to_string()];
        let backends = registry
            .resolve(&order, |_| RecognitionConfig::default())
            .await;

        let ids: Vec<String> = backends.iter().map(|b| b.info().id).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn resolve_skips_unknown_and_failing_backends() {
        let mut registry = BackendRegistry::new();
        registry.register(Box::new(MockBackendFactory::with_id("good")));
        registry.register(Box::new(MockBackendFactory::failing_init("broken")));

        let order = vec![
            "missing".to_string(),
            "broken".to_string(),
            "good".to_string(),
        ];
        let backends = registry
            .resolve(&order, |_| RecognitionConfig::default())
            .await;

        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].info().id, "good");
    }

    #[tokio::test]
    async fn registered_reports_availability() {
        let mut registry = BackendRegistry::new();
        registry.register(Box::new(MockBackendFactory::with_id("mock")));
        let infos = registry.registered();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].0.id, "mock");
        assert!(infos[0].1);
    }
}
