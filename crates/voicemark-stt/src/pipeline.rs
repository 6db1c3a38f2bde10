//! Pipeline façade: normalize once, aggregate across backends.

use tracing::debug;

use voicemark_audio::{Normalizer, VoiceClip, Waveform};
use voicemark_foundation::PipelineError;

use crate::aggregator::{Aggregator, Recognition};
use crate::types::ExpectedCommand;

/// One-stop entry point for a single recognition invocation.
///
/// Returns a plain data value and performs no messaging or persistence
/// calls. Leaves no filesystem state behind: the clip's temp file is
/// owned by the caller-supplied [`VoiceClip`] and the waveform lives in
/// memory only.
pub struct Pipeline {
    normalizer: Normalizer,
    aggregator: Aggregator,
}

impl Pipeline {
    pub fn new(normalizer: Normalizer, aggregator: Aggregator) -> Self {
        Self {
            normalizer,
            aggregator,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Normalize the clip once and run every backend against the shared
    /// waveform. Every shipped backend consumes normalized PCM, so a
    /// normalization failure fails the whole invocation.
    pub async fn run(
        &self,
        clip: &VoiceClip,
        expected: &ExpectedCommand,
    ) -> Result<Recognition, PipelineError> {
        let waveform = self.normalizer.normalize(clip).await?;
        debug!(
            duration_secs = waveform.duration_secs(),
            samples = waveform.samples.len(),
            command = %expected.tag,
            "clip normalized"
        );
        self.aggregator.transcribe(&waveform, expected).await
    }

    /// Variant for callers that already hold normalized PCM.
    pub async fn run_waveform(
        &self,
        waveform: &Waveform,
        expected: &ExpectedCommand,
    ) -> Result<Recognition, PipelineError> {
        self.aggregator.transcribe(waveform, expected).await
    }
}
