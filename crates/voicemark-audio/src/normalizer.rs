//! Format normalization: compressed voice container -> 16 kHz mono PCM.
//!
//! Decoding is delegated to an external `ffmpeg` binary writing WAV to
//! stdout. The result is parsed with hound and, if the decoder's output
//! deviates from the target format, downmixed and resampled here. The
//! input file is never mutated or deleted; the caller owns it.

use std::io::Cursor;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};
use voicemark_foundation::ConversionError;

use crate::clip::VoiceClip;
use crate::resampler::WaveformResampler;
use crate::waveform::Waveform;

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Target sample rate for backend consumption.
    pub sample_rate_hz: u32,
    /// Transcoder binary. Overridable for test doubles and odd installs.
    pub ffmpeg_bin: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: voicemark_foundation::DEFAULT_SAMPLE_RATE_HZ,
            ffmpeg_bin: "ffmpeg".to_string(),
        }
    }
}

/// Converts compressed clips into normalized waveforms.
///
/// One normalization pass per clip; the produced waveform is shared by
/// every backend that consumes PCM.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Decode and normalize a clip. Fails with [`ConversionError`] on a
    /// malformed container, missing transcoder, or decoder failure; the
    /// caller treats this as a non-retryable per-invocation failure.
    pub async fn normalize(&self, clip: &VoiceClip) -> Result<Waveform, ConversionError> {
        let wav_bytes = self.transcode(clip).await?;
        self.parse_wav(&wav_bytes)
    }

    async fn transcode(&self, clip: &VoiceClip) -> Result<Vec<u8>, ConversionError> {
        let output = Command::new(&self.config.ffmpeg_bin)
            .arg("-hide_banner")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(clip.path())
            .args(["-f", "wav"])
            .args(["-c:a", "pcm_s16le"])
            .args(["-ac", "1"])
            .args(["-ar", &self.config.sample_rate_hz.to_string()])
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConversionError::TranscoderMissing(self.config.ffmpeg_bin.clone())
                } else {
                    ConversionError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::TranscoderFailed(format!(
                "{} ({})",
                stderr.trim(),
                output.status
            )));
        }

        debug!(
            bytes = output.stdout.len(),
            clip = %clip.path().display(),
            "transcoded clip to wav"
        );
        Ok(output.stdout)
    }

    fn parse_wav(&self, bytes: &[u8]) -> Result<Waveform, ConversionError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| ConversionError::BadWav(e.to_string()))?;
        let spec = reader.spec();

        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(ConversionError::BadWav(format!(
                "expected s16le samples, got {} bits {:?}",
                spec.bits_per_sample, spec.sample_format
            )));
        }

        let samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .map_err(|e| ConversionError::BadWav(e.to_string()))?;

        // ffmpeg was asked for mono at the target rate; guard anyway so
        // the waveform contract holds for any decoder output.
        let mono = if spec.channels > 1 {
            warn!(channels = spec.channels, "decoder returned multichannel audio, downmixing");
            downmix(&samples, spec.channels)
        } else {
            samples
        };

        let pinned = if spec.sample_rate != self.config.sample_rate_hz {
            warn!(
                got = spec.sample_rate,
                want = self.config.sample_rate_hz,
                "decoder returned unexpected rate, resampling"
            );
            WaveformResampler::new(spec.sample_rate, self.config.sample_rate_hz)?.resample(&mono)?
        } else {
            mono
        };

        if pinned.is_empty() {
            return Err(ConversionError::BadWav("decoded waveform is empty".into()));
        }

        Ok(Waveform::new(pinned, self.config.sample_rate_hz))
    }
}

fn downmix(interleaved: &[i16], channels: u16) -> Vec<i16> {
    interleaved
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(NormalizerConfig::default())
    }

    #[test]
    fn parses_mono_16k_wav_unchanged() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let samples = vec![1i16, -2, 3, -4];
        let wf = normalizer().parse_wav(&wav_bytes(spec, &samples)).unwrap();
        assert_eq!(wf.sample_rate_hz, 16_000);
        assert_eq!(wf.channels, 1);
        assert_eq!(wf.samples, samples);
    }

    #[test]
    fn downmixes_stereo_by_averaging() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // L/R interleaved
        let samples = vec![100i16, 300, -100, -300];
        let wf = normalizer().parse_wav(&wav_bytes(spec, &samples)).unwrap();
        assert_eq!(wf.samples, vec![200i16, -200]);
    }

    #[test]
    fn resamples_unexpected_rate_to_target() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let samples = vec![500i16; 8_000];
        let wf = normalizer().parse_wav(&wav_bytes(spec, &samples)).unwrap();
        assert_eq!(wf.sample_rate_hz, 16_000);
        assert_eq!(wf.samples.len(), 16_000);
    }

    #[test]
    fn rejects_empty_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let err = normalizer().parse_wav(&wav_bytes(spec, &[])).unwrap_err();
        assert!(matches!(err, ConversionError::BadWav(_)));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = normalizer().parse_wav(b"not a wav file").unwrap_err();
        assert!(matches!(err, ConversionError::BadWav(_)));
    }

    #[tokio::test]
    async fn missing_transcoder_is_reported_as_such() {
        let norm = Normalizer::new(NormalizerConfig {
            ffmpeg_bin: "/nonexistent/voicemark-ffmpeg".to_string(),
            ..Default::default()
        });
        let clip = VoiceClip::from_path("/tmp/whatever.ogg");
        let err = norm.normalize(&clip).await.unwrap_err();
        assert!(matches!(err, ConversionError::TranscoderMissing(_)));
    }
}
