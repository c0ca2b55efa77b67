//! Wire types and error mapping
//!
//! JSON bodies for every route, plus the transport-boundary conversion
//! from [`TimbreError`] to an HTTP status and error body. Handlers stay
//! free of status-code logic; they return `Result` and the mapping here
//! does the rest.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::error::TimbreError;
use crate::pipeline::ConversionRecord;

/// Body of `GET /getmodels` and `POST /rescan`.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// Body of `GET /selectModel/{modelName}`.
#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub selected: String,
}

/// Body of a successful `POST /upload`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub id: String,
    pub model: String,
    pub sample_rate: u32,
    pub num_samples: usize,
    pub duration_secs: f32,
    pub elapsed_ms: u64,
}

impl From<ConversionRecord> for UploadResponse {
    fn from(record: ConversionRecord) -> Self {
        let duration_secs = record.duration_secs();
        Self {
            status: "done",
            id: record.id,
            model: record.model,
            sample_rate: record.sample_rate,
            num_samples: record.num_samples,
            duration_secs,
            elapsed_ms: record.elapsed_ms,
        }
    }
}

/// Body of `DELETE /cleanup/{id}`.
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: String,
}

/// Body of `GET /info`.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub models_dir: String,
    pub model_count: usize,
    pub selected_model: Option<String>,
    pub output_sample_rate: u32,
    pub conversions: usize,
}

fn status_for(err: &TimbreError) -> StatusCode {
    match err {
        TimbreError::MissingFile { .. } => StatusCode::BAD_REQUEST,
        TimbreError::DecodeFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TimbreError::ModelNotFound { .. } | TimbreError::OutputNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        TimbreError::NoModelsAvailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for TimbreError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("request failed: {}", self);
        } else {
            warn!("request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.error_code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        let missing = TimbreError::MissingFile {
            reason: "no field".to_string(),
        };
        assert_eq!(status_for(&missing), StatusCode::BAD_REQUEST);

        let decode = TimbreError::DecodeFailed {
            reason: "not audio".to_string(),
        };
        assert_eq!(status_for(&decode), StatusCode::UNPROCESSABLE_ENTITY);

        let unknown_model = TimbreError::ModelNotFound {
            model: "z.onnx".to_string(),
        };
        assert_eq!(status_for(&unknown_model), StatusCode::NOT_FOUND);

        let no_output = TimbreError::OutputNotFound {
            reason: "nothing converted".to_string(),
        };
        assert_eq!(status_for(&no_output), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_server_errors_map_to_5xx() {
        let empty = TimbreError::NoModelsAvailable {
            dir: "./models".to_string(),
        };
        assert_eq!(status_for(&empty), StatusCode::SERVICE_UNAVAILABLE);

        let inference = TimbreError::InferenceFailed {
            reason: "session run".to_string(),
        };
        assert_eq!(status_for(&inference), StatusCode::INTERNAL_SERVER_ERROR);

        let internal = TimbreError::Internal {
            reason: "poisoned lock".to_string(),
        };
        assert_eq!(status_for(&internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upload_response_from_record() {
        let record = ConversionRecord {
            id: "abc".to_string(),
            model: "a.onnx".to_string(),
            output_path: "transformed_abc.wav".into(),
            sample_rate: 44_100,
            num_samples: 44_100,
            elapsed_ms: 12,
        };

        let body = UploadResponse::from(record);
        assert_eq!(body.status, "done");
        assert_eq!(body.id, "abc");
        assert_eq!(body.model, "a.onnx");
        assert!((body.duration_secs - 1.0).abs() < 1e-6);
    }
}
