//! Mock converter for testing
//!
//! Does no real inference; scales samples by a fixed gain (or fails on
//! demand) so pipeline and server tests can run without ONNX models.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::convert::Converter;
use crate::audio::Waveform;
use crate::error::{Result, TimbreError};

/// Converter that scales samples instead of running a model
pub struct MockConverter {
    gain: f32,
    fail: bool,
    calls: AtomicUsize,
}

impl MockConverter {
    /// Identity conversion: output equals input
    pub fn new() -> Self {
        Self::with_gain(1.0)
    }

    /// Conversion that multiplies every sample by `gain`
    pub fn with_gain(gain: f32) -> Self {
        Self {
            gain,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Conversion that always fails
    pub fn failing() -> Self {
        Self {
            gain: 1.0,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of conversions attempted so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for MockConverter {
    fn convert(&self, model_path: &Path, input: &Waveform) -> Result<Waveform> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(TimbreError::InferenceFailed {
                reason: format!("mock failure for {}", model_path.display()),
            });
        }

        let samples = input.samples().iter().map(|s| s * self.gain).collect();
        Ok(Waveform::new(samples, input.sample_rate()))
    }
}
