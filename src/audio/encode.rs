//! WAV output encoding
//!
//! Transformed clips are written as 16-bit PCM mono WAV, the format
//! download clients expect.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::audio::Waveform;
use crate::error::{Result, TimbreError};

/// Bit depth of transformed output files
const OUTPUT_BITS: u16 = 16;

/// Write a waveform to disk as 16-bit PCM mono WAV
pub fn write_wav(wave: &Waveform, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: wave.sample_rate(),
        bits_per_sample: OUTPUT_BITS,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| TimbreError::EncodeFailed {
        path: path.display().to_string(),
        source: e,
    })?;

    let max_val = ((1u32 << (OUTPUT_BITS - 1)) - 1) as f32;
    for &sample in wave.samples() {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * max_val) as i16)
            .map_err(|e| TimbreError::EncodeFailed {
                path: path.display().to_string(),
                source: e,
            })?;
    }

    writer.finalize().map_err(|e| TimbreError::EncodeFailed {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
