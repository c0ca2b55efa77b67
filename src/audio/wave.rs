//! Mono waveform type
//!
//! Waveform is the sample container passed between decoding, resampling
//! and inference. Every upload is mixed down to one channel before it
//! reaches a model, so only mono audio is represented.

/// Mono audio samples with their sample rate
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Samples normalized to -1.0..1.0
    samples: Vec<f32>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from raw samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a sine wave test tone
    pub fn sine(frequency: f32, duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let mut samples = Vec::with_capacity(num_samples);

        for i in 0..num_samples {
            let t = i as f32 / sample_rate as f32;
            samples.push((2.0 * std::f32::consts::PI * frequency * t).sin());
        }

        Self {
            samples,
            sample_rate,
        }
    }

    /// Get a reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the waveform, returning the raw samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the waveform holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Root-mean-square level of the samples
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = self.samples.iter().map(|s| s * s).sum();
        (sum_sq / self.samples.len() as f32).sqrt()
    }

    /// Check if waveforms are approximately equal within tolerance
    pub fn is_approx_equal(&self, other: &Waveform, tolerance: f32) -> bool {
        if self.sample_rate != other.sample_rate || self.samples.len() != other.samples.len() {
            return false;
        }
        self.samples
            .iter()
            .zip(other.samples.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}
