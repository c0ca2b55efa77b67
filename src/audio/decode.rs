//! Audio container decoding
//!
//! Turns an uploaded file into a mono waveform at its native sample
//! rate. WAV files go through hound directly; compressed containers
//! (MP3, M4A/AAC, FLAC, OGG) go through the symphonia probe.
//! Multi-channel audio is mixed down by frame averaging.

use std::fs::File;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::audio::Waveform;
use crate::error::{Result, TimbreError};

/// Decode an audio file into a mono waveform
pub fn decode_file(path: &Path) -> Result<Waveform> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let wave = if extension == "wav" {
        decode_wav(path)?
    } else {
        decode_with_probe(path, &extension)?
    };

    if wave.is_empty() {
        return Err(TimbreError::DecodeFailed {
            reason: format!("{} decoded to zero samples", path.display()),
        });
    }

    debug!(
        "decoded {} ({} samples at {} Hz)",
        path.display(),
        wave.len(),
        wave.sample_rate()
    );
    Ok(wave)
}

/// Decode a WAV file with hound
fn decode_wav(path: &Path) -> Result<Waveform> {
    let reader = WavReader::open(path).map_err(|e| TimbreError::DecodeFailed {
        reason: format!("failed to open WAV {}: {}", path.display(), e),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let sample_rate = spec.sample_rate;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map_err(|e| wav_data_error(path, e)))
            .collect::<Result<Vec<f32>>>()?,
        SampleFormat::Int => {
            let max_val = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| {
                    s.map(|v| v as f32 / max_val)
                        .map_err(|e| wav_data_error(path, e))
                })
                .collect::<Result<Vec<f32>>>()?
        }
    };

    Ok(mix_down(samples, channels, sample_rate))
}

fn wav_data_error(path: &Path, source: hound::Error) -> TimbreError {
    TimbreError::DecodeFailed {
        reason: format!("invalid WAV data in {}: {}", path.display(), source),
    }
}

/// Decode a compressed container through the symphonia probe
fn decode_with_probe(path: &Path, extension: &str) -> Result<Waveform> {
    let file = File::open(path).map_err(|e| TimbreError::DecodeFailed {
        reason: format!("failed to open {}: {}", path.display(), e),
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if !extension.is_empty() {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &Default::default(), &Default::default())
        .map_err(|e| TimbreError::DecodeFailed {
            reason: format!("unrecognized audio format in {}: {}", path.display(), e),
        })?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TimbreError::DecodeFailed {
            reason: format!("no audio track in {}", path.display()),
        })?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| TimbreError::DecodeFailed {
            reason: format!("no sample rate reported for {}", path.display()),
        })?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1)
        .max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| TimbreError::DecodeFailed {
            reason: format!("no decoder for {}: {}", path.display(), e),
        })?;

    let mut pcm = Vec::new();
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                let mut sample_buf =
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                sample_buf.copy_interleaved_ref(decoded);
                pcm.extend_from_slice(sample_buf.samples());
            }
            Err(e) => {
                // Bad packets are skipped; the final sample count decides
                warn!("skipping undecodable packet in {}: {}", path.display(), e);
            }
        }
    }

    Ok(mix_down(pcm, channels, sample_rate))
}

/// Average interleaved frames down to a single channel
fn mix_down(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Waveform {
    if channels <= 1 {
        return Waveform::new(samples, sample_rate);
    }

    let mut mono = Vec::with_capacity(samples.len() / channels);
    for frame in samples.chunks(channels) {
        mono.push(frame.iter().sum::<f32>() / frame.len() as f32);
    }
    Waveform::new(mono, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Write;
    use tempfile::tempdir;
    use test_case::test_case;

    fn write_float_wav(path: &Path, samples: &[f32], channels: u16, sample_rate: u32) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_float_mono_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let original = Waveform::sine(440.0, 0.25, 44100);
        write_float_wav(&path, original.samples(), 1, 44100);

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate(), 44100);
        assert_eq!(decoded.len(), original.len());
        assert!(decoded.is_approx_equal(&original, 1e-6));
    }

    #[test]
    fn test_decode_int16_wav_normalizes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int16.wav");

        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for v in [i16::MAX, 0, i16::MIN] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate(), 22050);
        assert_eq!(decoded.len(), 3);
        assert!(decoded.samples().iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!((decoded.samples()[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_stereo_mixes_down_to_mono() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        // Opposite-phase channels cancel out when averaged
        let frames = 1000;
        let mut interleaved = Vec::with_capacity(frames * 2);
        for _ in 0..frames {
            interleaved.push(0.5);
            interleaved.push(-0.5);
        }
        write_float_wav(&path, &interleaved, 2, 44100);

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.len(), frames);
        assert!(decoded.samples().iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn test_decode_missing_file() {
        let result = decode_file(Path::new("no_such_file.wav"));
        assert!(matches!(result, Err(TimbreError::DecodeFailed { .. })));
    }

    #[test_case("wav")]
    #[test_case("mp3")]
    fn test_decode_garbage_bytes(ext: &str) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(format!("garbage.{ext}"));
        let mut file = File::create(&path).unwrap();
        file.write_all(b"this is definitely not audio data").unwrap();

        let result = decode_file(&path);
        assert!(matches!(result, Err(TimbreError::DecodeFailed { .. })));
    }

    #[test]
    fn test_empty_wav_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_float_wav(&path, &[], 1, 44100);

        let result = decode_file(&path);
        assert!(matches!(result, Err(TimbreError::DecodeFailed { .. })));
    }
}
