//! Timbre - Voice Conversion Service
//!
//! Timbre wraps ONNX voice-conversion models in a small HTTP service:
//! clients upload an audio clip, the clip is decoded and resampled to
//! the model rate, run through the currently selected model, and the
//! result is served back as a 16-bit WAV.
//!
//! # Architecture
//!
//! - [`model`]: the on-disk model registry and the ONNX inference seam
//! - [`audio`]: decode, resample and encode between client formats and
//!   the model's mono 44.1 kHz frame
//! - [`pipeline`]: one conversion end to end, plus the record store
//!   that backs downloads
//! - [`server`]: the axum routes tying it all together

pub mod audio;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod server;

pub use error::{Result, TimbreError};
