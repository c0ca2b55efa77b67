//! Sample rate conversion
//!
//! Narrow wrapper around rubato's sinc resampler. Models run at one
//! fixed rate, so any upload that arrives at a different rate passes
//! through here on its way to inference.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::audio::Waveform;
use crate::error::{Result, TimbreError};

/// Input frames handed to the resampler per call. SincFixedIn rejects
/// blocks of any other length, so the final block is zero-padded.
const BLOCK_SIZE: usize = 1024;

/// Resample a mono waveform to the target rate
///
/// Returns the input untouched when the rates already match, keeping
/// same-rate uploads bit-exact.
pub fn to_rate(wave: Waveform, target_rate: u32) -> Result<Waveform> {
    if wave.sample_rate() == target_rate {
        return Ok(wave);
    }

    let source_rate = wave.sample_rate();
    let ratio = target_rate as f64 / source_rate as f64;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 1.0, params, BLOCK_SIZE, 1).map_err(|e| {
            TimbreError::DecodeFailed {
                reason: format!("failed to initialize resampler: {}", e),
            }
        })?;

    let input = wave.into_samples();
    let input_len = input.len();
    let expected = (input_len as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(expected + BLOCK_SIZE * 2);

    for chunk in input.chunks(BLOCK_SIZE) {
        let block: Vec<f32> = if chunk.len() < BLOCK_SIZE {
            let mut padded = vec![0.0; BLOCK_SIZE];
            padded[..chunk.len()].copy_from_slice(chunk);
            padded
        } else {
            chunk.to_vec()
        };

        let frames = resampler
            .process(&[block], None)
            .map_err(|e| TimbreError::DecodeFailed {
                reason: format!("resampling failed: {}", e),
            })?;
        output.extend_from_slice(&frames[0]);
    }

    // Padding inflates the tail; trim back to the exact converted length
    output.truncate(expected);

    debug!(
        "resampled {} Hz -> {} Hz ({} -> {} samples)",
        source_rate,
        target_rate,
        input_len,
        output.len()
    );
    Ok(Waveform::new(output, target_rate))
}
