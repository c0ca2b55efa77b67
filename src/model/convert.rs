//! Inference over ONNX voice models
//!
//! The Converter trait is the seam between the conversion pipeline and
//! the inference runtime. OrtConverter is the production
//! implementation; it loads the model file fresh on every call, so a
//! conversion always runs against whatever is on disk right now and
//! nothing is cached between requests.

use std::path::Path;

use ort::execution_providers::CPUExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use tracing::debug;

use crate::audio::Waveform;
use crate::error::{Result, TimbreError};

/// Tensor name voice models expect their waveform on
pub const INPUT_NAME: &str = "audio_in";

/// One-shot voice conversion over a model file
pub trait Converter: Send + Sync {
    /// Run `input` through the model at `model_path`, producing the
    /// converted waveform at the same sample rate
    fn convert(&self, model_path: &Path, input: &Waveform) -> Result<Waveform>;
}

/// ONNX Runtime backed converter
pub struct OrtConverter;

impl OrtConverter {
    /// Create a converter, initializing the ONNX runtime
    ///
    /// Safe to call more than once; later initializations are no-ops.
    pub fn new() -> Result<Self> {
        ort::init()
            .commit()
            .map_err(|e| TimbreError::InferenceFailed {
                reason: format!("failed to initialize onnx runtime: {e}"),
            })?;
        Ok(Self)
    }
}

impl Converter for OrtConverter {
    fn convert(&self, model_path: &Path, input: &Waveform) -> Result<Waveform> {
        let mut session = Session::builder()
            .map_err(|e| inference_error("failed to create session builder", e))?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(|e| inference_error("failed to set execution providers", e))?
            .commit_from_file(model_path)
            .map_err(|e| TimbreError::InferenceFailed {
                reason: format!("failed to load model {}: {e}", model_path.display()),
            })?;

        let output_name = session
            .outputs
            .first()
            .ok_or_else(|| TimbreError::InferenceFailed {
                reason: "model has no outputs".to_string(),
            })?
            .name
            .clone();

        // Models take one [batch, channels, samples] waveform tensor
        let shape = vec![1usize, 1, input.len()];
        let tensor = Value::from_array((shape, input.samples().to_vec()))
            .map_err(|e| inference_error("failed to create input tensor", e))?;

        let inputs: Vec<(&str, Value)> = vec![(INPUT_NAME, tensor.into())];
        let outputs = session
            .run(inputs)
            .map_err(|e| inference_error("inference run failed", e))?;

        let output_value =
            outputs
                .get(output_name.as_str())
                .ok_or_else(|| TimbreError::InferenceFailed {
                    reason: format!("model output '{output_name}' missing from results"),
                })?;

        let (out_shape, out_slice) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error("failed to extract output tensor", e))?;

        if out_slice.is_empty() {
            return Err(TimbreError::InferenceFailed {
                reason: "model produced an empty waveform".to_string(),
            });
        }

        let dims: Vec<usize> = out_shape.iter().map(|&d| d.max(0) as usize).collect();
        debug!("model output shape {:?} ({} samples)", dims, out_slice.len());

        // Squeeze the batch and channel dimensions into flat mono
        Ok(Waveform::new(out_slice.to_vec(), input.sample_rate()))
    }
}

fn inference_error(context: &str, e: ort::Error) -> TimbreError {
    TimbreError::InferenceFailed {
        reason: format!("{context}: {e}"),
    }
}
