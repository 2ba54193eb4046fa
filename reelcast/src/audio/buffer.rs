/// Decoded interleaved floating-point PCM.
///
/// DSP functions take buffers by value and hand back a new (or the same) buffer; once a buffer is
/// scheduled in the mix graph it is shared read-only behind an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    /// Build a buffer from interleaved samples.
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// A buffer of `secs` seconds of silence.
    pub fn silence(sample_rate: u32, channels: u16, secs: f64) -> Self {
        let frames = (secs.max(0.0) * f64::from(sample_rate)).round() as usize;
        Self {
            sample_rate,
            channels,
            samples: vec![0.0; frames * usize::from(channels)],
        }
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / usize::from(self.channels)
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Whether the buffer holds no sample frames.
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Sample at `(frame, channel)`; mono buffers answer every channel.
    #[inline]
    pub(crate) fn sample(&self, frame: usize, channel: usize) -> f32 {
        let ch = usize::from(self.channels);
        let c = if channel < ch { channel } else { 0 };
        self.samples[frame * ch + c]
    }

    /// Per-frame average across channels.
    pub(crate) fn mixdown(&self) -> Vec<f32> {
        let ch = usize::from(self.channels);
        if ch == 0 {
            return Vec::new();
        }
        if ch == 1 {
            return self.samples.clone();
        }
        let inv = 1.0 / ch as f32;
        self.samples
            .chunks_exact(ch)
            .map(|f| f.iter().sum::<f32>() * inv)
            .collect()
    }

    /// Multiply every sample by `gain`.
    pub fn apply_gain(mut self, gain: f32) -> Self {
        if (gain - 1.0).abs() > f32::EPSILON {
            for s in &mut self.samples {
                *s *= gain;
            }
        }
        self
    }
}
