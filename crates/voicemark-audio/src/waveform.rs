/// Normalized mono PCM buffer.
///
/// Produced by the normalizer, consumed by recognition backends, never
/// persisted beyond one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<i16>,
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl Waveform {
    pub fn new(samples: Vec<i16>, sample_rate_hz: u32) -> Self {
        Self {
            samples,
            sample_rate_hz,
            channels: 1,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate_hz as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_reflects_sample_count() {
        let wf = Waveform::new(vec![0i16; 16_000], 16_000);
        assert!((wf.duration_secs() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_waveform_has_zero_duration() {
        let wf = Waveform::new(Vec::new(), 16_000);
        assert!(wf.is_empty());
        assert_eq!(wf.duration_secs(), 0.0);
    }
}
