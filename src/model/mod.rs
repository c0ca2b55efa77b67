//! Model registry and inference
//!
//! Scanning and selecting the on-disk voice models, plus the converter
//! seam that runs them.

pub mod convert;
pub mod mock;
pub mod registry;

pub use convert::{Converter, OrtConverter, INPUT_NAME};
pub use mock::MockConverter;
pub use registry::{ModelRegistry, MODEL_EXTENSION};
