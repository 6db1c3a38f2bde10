//! Mock backend for testing the aggregation pipeline.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use voicemark_audio::Waveform;
use voicemark_foundation::RecognitionError;

use crate::backend::{BackendFactory, BackendInfo, SpeechBackend};
use crate::types::RecognitionConfig;

/// Configurable test double: fixed transcript or error, optional delay,
/// optional failure after N calls.
#[derive(Debug)]
pub struct MockBackend {
    id: String,
    transcript: Option<String>,
    error: Option<String>,
    delay: Option<Duration>,
    fail_after_calls: Option<usize>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn with_transcript(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: Some(text.into()),
            error: None,
            delay: None,
            fail_after_calls: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_error(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: None,
            error: Some(error.into()),
            delay: None,
            fail_after_calls: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after_calls = Some(calls);
        self
    }

    pub fn calls_made(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackend for MockBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            id: self.id.clone(),
            name: format!("Mock ({})", self.id),
            requires_network: false,
            is_local: true,
            supported_languages: vec!["ru".to_string(), "en".to_string()],
        }
    }

    async fn is_available(&self) -> Result<bool, RecognitionError> {
        Ok(true)
    }

    async fn initialize(&mut self, _config: RecognitionConfig) -> Result<(), RecognitionError> {
        Ok(())
    }

    async fn recognize(&self, _waveform: &Waveform) -> Result<String, RecognitionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(limit) = self.fail_after_calls {
            if call > limit {
                return Err(RecognitionError::Backend(format!(
                    "simulated failure on call {call}"
                )));
            }
        }

        if let Some(ref error) = self.error {
            return Err(RecognitionError::Network(error.clone()));
        }

        Ok(self.transcript.clone().unwrap_or_default())
    }
}

/// Factory producing mock backends, with variants for registry tests.
pub struct MockBackendFactory {
    id: String,
    transcript: String,
    fail_init: bool,
}

impl MockBackendFactory {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: "mock transcript".to_string(),
            fail_init: false,
        }
    }

    pub fn with_transcript(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: text.into(),
            fail_init: false,
        }
    }

    pub fn failing_init(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: String::new(),
            fail_init: true,
        }
    }
}

impl BackendFactory for MockBackendFactory {
    fn create(&self) -> Result<Box<dyn SpeechBackend>, RecognitionError> {
        if self.fail_init {
            return Ok(Box::new(FailingInitBackend {
                id: self.id.clone(),
            }));
        }
        Ok(Box::new(MockBackend::with_transcript(
            self.id.clone(),
            self.transcript.clone(),
        )))
    }

    fn backend_info(&self) -> BackendInfo {
        BackendInfo {
            id: self.id.clone(),
            name: format!("Mock ({})", self.id),
            requires_network: false,
            is_local: true,
            supported_languages: vec!["ru".to_string(), "en".to_string()],
        }
    }

    fn check_requirements(&self) -> Result<(), RecognitionError> {
        Ok(())
    }
}

/// Backend whose initialize always fails, for registry skip tests.
#[derive(Debug)]
struct FailingInitBackend {
    id: String,
}

#[async_trait]
impl SpeechBackend for FailingInitBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            id: self.id.clone(),
            name: format!("Mock ({})", self.id),
            requires_network: false,
            is_local: true,
            supported_languages: vec![],
        }
    }

    async fn is_available(&self) -> Result<bool, RecognitionError> {
        Ok(false)
    }

    async fn initialize(&mut self, _config: RecognitionConfig) -> Result<(), RecognitionError> {
        Err(RecognitionError::ModelLoadFailed(
            "simulated init failure".to_string(),
        ))
    }

    async fn recognize(&self, _waveform: &Waveform) -> Result<String, RecognitionError> {
        Err(RecognitionError::NotAvailable {
            reason: "never initialized".to_string(),
        })
    }
}
