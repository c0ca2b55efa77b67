//! Error types for Timbre
//!
//! Every fallible operation in the crate returns TimbreError, so route
//! handlers can map failures onto stable wire codes instead of crashing
//! the process.

use thiserror::Error;

/// Result type alias using TimbreError
pub type Result<T> = std::result::Result<T, TimbreError>;

/// All possible errors in Timbre
#[derive(Error, Debug)]
pub enum TimbreError {
    // Upload errors
    #[error("No usable audio file in request: {reason}")]
    MissingFile { reason: String },

    #[error("Failed to save uploaded file: {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Audio errors
    #[error("Failed to decode audio: {reason}")]
    DecodeFailed { reason: String },

    #[error("Failed to write transformed audio: {path}")]
    EncodeFailed {
        path: String,
        #[source]
        source: hound::Error,
    },

    // Model errors
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("No models available in {dir}")]
    NoModelsAvailable { dir: String },

    #[error("Failed to read models directory: {path}")]
    ModelDirUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Inference failed: {reason}")]
    InferenceFailed { reason: String },

    // Download errors
    #[error("No transformed audio available: {reason}")]
    OutputNotFound { reason: String },

    // Internal invariant failures (poisoned locks, aborted tasks)
    #[error("Internal error: {reason}")]
    Internal { reason: String },

    // Generic I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TimbreError {
    /// Get the stable wire code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            TimbreError::MissingFile { .. } => "MISSING_FILE",
            TimbreError::SaveFailed { .. } => "SAVE_FAILED",
            TimbreError::DecodeFailed { .. } => "DECODE_FAILED",
            TimbreError::EncodeFailed { .. } => "ENCODE_FAILED",
            TimbreError::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            TimbreError::NoModelsAvailable { .. } => "NO_MODELS_AVAILABLE",
            TimbreError::ModelDirUnreadable { .. } => "MODEL_DIR_UNREADABLE",
            TimbreError::InferenceFailed { .. } => "INFERENCE_FAILED",
            TimbreError::OutputNotFound { .. } => "NOT_FOUND",
            TimbreError::Internal { .. } => "INTERNAL_ERROR",
            TimbreError::Io(_) => "IO_ERROR",
        }
    }

    /// True for errors caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TimbreError::MissingFile { .. }
                | TimbreError::DecodeFailed { .. }
                | TimbreError::ModelNotFound { .. }
                | TimbreError::OutputNotFound { .. }
        )
    }
}
