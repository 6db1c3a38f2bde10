//! Google Cloud Speech backend for Voicemark.
//!
//! Cloud recognition over the `speech:recognize` REST endpoint: no local
//! model, best accuracy for short clips, but needs network and an API
//! key. The waveform is shipped as base64 LINEAR16 (raw s16le PCM), so
//! no container is built around it.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use voicemark_audio::Waveform;
use voicemark_foundation::RecognitionError;
use voicemark_stt::{BackendFactory, BackendInfo, RecognitionConfig, SpeechBackend};

const RECOGNIZE_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

fn backend_info() -> BackendInfo {
    BackendInfo {
        id: "gcloud".to_string(),
        name: "Google Cloud Speech".to_string(),
        requires_network: true,
        is_local: false,
        supported_languages: vec!["ru".to_string(), "en".to_string()],
    }
}

/// Map an ISO 639-1 language to the BCP-47 code the API expects.
fn language_code(language: &str) -> String {
    match language {
        "ru" => "ru-RU".to_string(),
        "en" => "en-US".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<RecognizeAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognizeAlternative {
    #[serde(default)]
    transcript: String,
}

pub struct GcloudBackend {
    client: reqwest::Client,
    api_key_env: String,
    api_key: Option<String>,
    language_code: String,
    sample_rate_hz: u32,
}

impl GcloudBackend {
    pub fn new(api_key_env: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key_env: api_key_env.into(),
            api_key: None,
            language_code: language_code("ru"),
            sample_rate_hz: voicemark_foundation::DEFAULT_SAMPLE_RATE_HZ,
        }
    }

    fn parse_transcript(response: RecognizeResponse) -> Result<String, RecognitionError> {
        let transcript = response
            .results
            .into_iter()
            .flat_map(|r| r.alternatives.into_iter().take(1))
            .map(|a| a.transcript)
            .collect::<Vec<_>>()
            .join(" ");

        if transcript.trim().is_empty() {
            Err(RecognitionError::EmptyTranscript)
        } else {
            Ok(transcript)
        }
    }
}

impl std::fmt::Debug for GcloudBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcloudBackend")
            .field("api_key_env", &self.api_key_env)
            .field("has_key", &self.api_key.is_some())
            .field("language_code", &self.language_code)
            .finish()
    }
}

#[async_trait]
impl SpeechBackend for GcloudBackend {
    fn info(&self) -> BackendInfo {
        backend_info()
    }

    async fn is_available(&self) -> Result<bool, RecognitionError> {
        Ok(self.api_key.is_some())
    }

    async fn initialize(&mut self, config: RecognitionConfig) -> Result<(), RecognitionError> {
        let key = std::env::var(&self.api_key_env).map_err(|_| RecognitionError::NotAvailable {
            reason: format!("API key env var '{}' is not set", self.api_key_env),
        })?;

        self.api_key = Some(key);
        self.language_code = language_code(&config.language);
        self.sample_rate_hz = config.sample_rate_hz;
        Ok(())
    }

    async fn recognize(&self, waveform: &Waveform) -> Result<String, RecognitionError> {
        // The request declares the configured rate, so a waveform at any
        // other rate would transcribe garbled audio.
        if waveform.sample_rate_hz != self.sample_rate_hz {
            return Err(RecognitionError::Backend(format!(
                "waveform is {} Hz but the backend is configured for {} Hz",
                waveform.sample_rate_hz, self.sample_rate_hz
            )));
        }

        let key = self.api_key.as_ref().ok_or(RecognitionError::NotAvailable {
            reason: "Google Cloud backend not initialized".to_string(),
        })?;

        // LINEAR16 is raw little-endian PCM, exactly our waveform bytes.
        let mut pcm_bytes = Vec::with_capacity(waveform.samples.len() * 2);
        for sample in &waveform.samples {
            pcm_bytes.extend_from_slice(&sample.to_le_bytes());
        }
        let content = base64::engine::general_purpose::STANDARD.encode(&pcm_bytes);

        let body = serde_json::json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": self.sample_rate_hz,
                "languageCode": self.language_code,
            },
            "audio": { "content": content },
        });

        let response = self
            .client
            .post(RECOGNIZE_URL)
            .query(&[("key", key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| RecognitionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Network(format!(
                "speech:recognize returned HTTP {status}: {}",
                detail.trim()
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Network(format!("bad response body: {e}")))?;

        debug!(results = parsed.results.len(), "speech:recognize responded");
        Self::parse_transcript(parsed)
    }
}

pub struct GcloudBackendFactory {
    api_key_env: String,
}

impl GcloudBackendFactory {
    pub fn new(api_key_env: impl Into<String>) -> Self {
        Self {
            api_key_env: api_key_env.into(),
        }
    }
}

impl BackendFactory for GcloudBackendFactory {
    fn create(&self) -> Result<Box<dyn SpeechBackend>, RecognitionError> {
        Ok(Box::new(GcloudBackend::new(self.api_key_env.clone())))
    }

    fn backend_info(&self) -> BackendInfo {
        backend_info()
    }

    fn check_requirements(&self) -> Result<(), RecognitionError> {
        if std::env::var(&self.api_key_env).is_err() {
            return Err(RecognitionError::NotAvailable {
                reason: format!("API key env var '{}' is not set", self.api_key_env),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_map_to_bcp47() {
        assert_eq!(language_code("ru"), "ru-RU");
        assert_eq!(language_code("en"), "en-US");
        assert_eq!(language_code("de-DE"), "de-DE");
    }

    #[test]
    fn transcript_joins_top_alternatives() {
        let response = RecognizeResponse {
            results: vec![
                RecognizeResult {
                    alternatives: vec![
                        RecognizeAlternative {
                            transcript: "обрезать видео".to_string(),
                        },
                        RecognizeAlternative {
                            transcript: "ignored second alternative".to_string(),
                        },
                    ],
                },
                RecognizeResult {
                    alternatives: vec![RecognizeAlternative {
                        transcript: "с пяти минут".to_string(),
                    }],
                },
            ],
        };
        assert_eq!(
            GcloudBackend::parse_transcript(response).unwrap(),
            "обрезать видео с пяти минут"
        );
    }

    #[test]
    fn empty_results_are_an_empty_transcript_error() {
        let response = RecognizeResponse { results: vec![] };
        assert!(matches!(
            GcloudBackend::parse_transcript(response),
            Err(RecognitionError::EmptyTranscript)
        ));
    }

    #[tokio::test]
    async fn mismatched_sample_rate_is_rejected() {
        let backend = GcloudBackend::new("VOICEMARK_TEST_NO_SUCH_KEY");
        let waveform = Waveform::new(vec![0i16; 80], 8_000);
        let err = backend.recognize(&waveform).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Backend(_)));
    }

    #[tokio::test]
    async fn uninitialized_backend_refuses_to_recognize() {
        let backend = GcloudBackend::new("VOICEMARK_TEST_NO_SUCH_KEY");
        let waveform = Waveform::new(vec![0i16; 160], 16_000);
        let err = backend.recognize(&waveform).await.unwrap_err();
        assert!(matches!(err, RecognitionError::NotAvailable { .. }));
    }
}
