use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use voicemark_foundation::ConversionError;

/// Chunk size fed to rubato per iteration. 512 samples at 16 kHz is 32 ms.
const CHUNK_SIZE: usize = 512;

/// Batch resampler for mono i16 speech audio.
///
/// Wraps rubato's sinc interpolation with a preset tuned for speech.
/// Used by the normalizer when the transcoder's output rate differs from
/// the configured target rate.
pub struct WaveformResampler {
    in_rate: u32,
    out_rate: u32,
    resampler: Option<SincFixedIn<f32>>,
}

impl WaveformResampler {
    pub fn new(in_rate: u32, out_rate: u32) -> Result<Self, ConversionError> {
        if in_rate == 0 || out_rate == 0 {
            return Err(ConversionError::Resample(format!(
                "invalid rates: {in_rate} -> {out_rate}"
            )));
        }

        if in_rate == out_rate {
            return Ok(Self {
                in_rate,
                out_rate,
                resampler: None,
            });
        }

        // Medium-quality sinc settings: good for speech, modest CPU cost.
        let params = SincInterpolationParameters {
            sinc_len: 64,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Cubic,
            oversampling_factor: 128,
            window: WindowFunction::Blackman2,
        };

        let resampler = SincFixedIn::<f32>::new(
            out_rate as f64 / in_rate as f64,
            2.0,
            params,
            CHUNK_SIZE,
            1, // mono
        )
        .map_err(|e| ConversionError::Resample(e.to_string()))?;

        Ok(Self {
            in_rate,
            out_rate,
            resampler: Some(resampler),
        })
    }

    /// Resample a complete mono buffer, flushing the filter tail.
    pub fn resample(&mut self, input: &[i16]) -> Result<Vec<i16>, ConversionError> {
        let resampler = match self.resampler.as_mut() {
            Some(r) => r,
            // Same-rate passthrough.
            None => return Ok(input.to_vec()),
        };

        if input.is_empty() {
            return Ok(Vec::new());
        }

        let samples: Vec<f32> = input.iter().map(|&s| s as f32 / 32768.0).collect();
        let delay = resampler.output_delay();
        let expected =
            (input.len() as u64 * self.out_rate as u64 / self.in_rate as u64) as usize;
        let mut output: Vec<f32> = Vec::with_capacity(delay + expected + CHUNK_SIZE);

        let mut chunks = samples.chunks_exact(CHUNK_SIZE);
        for chunk in &mut chunks {
            let frames = resampler
                .process(&[chunk.to_vec()], None)
                .map_err(|e| ConversionError::Resample(e.to_string()))?;
            if let Some(channel) = frames.first() {
                output.extend_from_slice(channel);
            }
        }

        // Trailing partial chunk. The fixed-input resampler zero-pads this to
        // a full chunk, so the surplus is trimmed below.
        let remainder = chunks.remainder();
        if !remainder.is_empty() {
            let tail = vec![remainder.to_vec()];
            let frames = resampler
                .process_partial(Some(tail.as_slice()), None)
                .map_err(|e| ConversionError::Resample(e.to_string()))?;
            if let Some(channel) = frames.first() {
                output.extend_from_slice(channel);
            }
        }

        // Flush until the sinc filter's startup delay plus the expected
        // frame count is covered.
        while output.len() < delay + expected {
            let frames = resampler
                .process_partial::<Vec<f32>>(None, None)
                .map_err(|e| ConversionError::Resample(e.to_string()))?;
            match frames.first() {
                Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
                _ => break,
            }
        }

        resampler.reset();

        // Drop the leading delay frames and pin the length to the rate ratio.
        Ok(output
            .into_iter()
            .skip(delay)
            .take(expected)
            .map(|s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
            .collect())
    }

    pub fn input_rate(&self) -> u32 {
        self.in_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.out_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_same_rate() {
        let mut rs = WaveformResampler::new(16_000, 16_000).unwrap();
        let input = vec![100i16, 200, 300, 400, 500];
        assert_eq!(rs.resample(&input).unwrap(), input);
    }

    #[test]
    fn downsample_48k_to_16k_yields_exactly_a_third() {
        let mut rs = WaveformResampler::new(48_000, 16_000).unwrap();
        let input: Vec<i16> = (0..48_000).map(|i| ((i % 200) as i16) - 100).collect();
        let out = rs.resample(&input).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn upsample_8k_to_16k_doubles_length() {
        let mut rs = WaveformResampler::new(8_000, 16_000).unwrap();
        let input = vec![1000i16; 8_000];
        let out = rs.resample(&input).unwrap();
        assert_eq!(out.len(), 16_000);
        // Startup delay is skipped, so the interior carries the signal level.
        let mid = out[out.len() / 2];
        assert!(
            (900..=1100).contains(&mid),
            "expected interior level near 1000, got {mid}"
        );
    }

    #[test]
    fn output_length_tracks_input_with_no_padding() {
        // A short clip must not pick up trailing chunk padding or the
        // filter's startup frames.
        let mut rs = WaveformResampler::new(8_000, 16_000).unwrap();
        let out = rs.resample(&vec![500i16; 4_000]).unwrap();
        assert_eq!(out.len(), 8_000);

        // A second invocation on the same resampler starts from a clean
        // filter and yields the same length.
        let again = rs.resample(&vec![500i16; 4_000]).unwrap();
        assert_eq!(again.len(), 8_000);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let mut rs = WaveformResampler::new(8_000, 16_000).unwrap();
        assert!(rs.resample(&[]).unwrap().is_empty());
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(WaveformResampler::new(0, 16_000).is_err());
        assert!(WaveformResampler::new(16_000, 0).is_err());
    }
}
