//! Route handlers
//!
//! Thin layer over the registry, pipeline and store. Handlers return
//! `Result<_, TimbreError>` so every failure path lands in the shared
//! status mapping instead of taking the process down.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

use crate::error::{Result, TimbreError};
use crate::pipeline::{ConversionPipeline, ConversionRecord, MODEL_SAMPLE_RATE};
use crate::server::response::{
    CleanupResponse, ModelsResponse, SelectResponse, ServerInfo, UploadResponse,
};
use crate::server::AppState;

/// `GET /`: liveness probe.
pub async fn index() -> &'static str {
    "Connection success !"
}

/// `GET /getmodels`: the model listing from the last scan.
pub async fn get_models(State(state): State<Arc<AppState>>) -> Result<Json<ModelsResponse>> {
    let models = state.registry.list()?;
    Ok(Json(ModelsResponse { models }))
}

/// `GET /selectModel/{modelName}`: switch the model used by later uploads.
///
/// The `.onnx` suffix is optional; `selectModel/b` and
/// `selectModel/b.onnx` pick the same model.
pub async fn select_model(
    State(state): State<Arc<AppState>>,
    Path(model_name): Path<String>,
) -> Result<Json<SelectResponse>> {
    let selected = state.registry.select(&model_name)?;
    Ok(Json(SelectResponse { selected }))
}

/// `POST /upload`: accept one audio file and run it through the
/// currently selected model.
///
/// The model is snapshotted before the blocking work starts, so a
/// concurrent `selectModel` cannot change which model this request
/// runs against.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let (filename, bytes) = read_file_field(multipart).await?;
    let (model_name, model_path) = state.registry.selected_snapshot()?;
    let id = ConversionPipeline::new_id();

    info!(
        "upload '{}' ({} bytes) -> conversion {} with model '{}'",
        filename,
        bytes.len(),
        id,
        model_name
    );

    let task_state = state.clone();
    let task_id = id.clone();
    let record = tokio::task::spawn_blocking(move || {
        let upload_path = task_state
            .pipeline
            .store_upload(&task_id, &filename, &bytes)?;
        task_state
            .pipeline
            .convert(&task_id, &model_name, &model_path, &upload_path)
    })
    .await
    .map_err(|e| TimbreError::Internal {
        reason: format!("conversion task aborted: {e}"),
    })??;

    state.store.insert(record.clone())?;
    Ok(Json(UploadResponse::from(record)))
}

/// Pull the `file` part out of a multipart body.
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) =
        multipart
            .next_field()
            .await
            .map_err(|e| TimbreError::MissingFile {
                reason: format!("malformed multipart payload: {e}"),
            })?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|name| name.to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TimbreError::MissingFile {
                reason: "no file selected".to_string(),
            })?;
        let bytes = field.bytes().await.map_err(|e| TimbreError::MissingFile {
            reason: format!("failed to read upload body: {e}"),
        })?;

        return Ok((filename, bytes.to_vec()));
    }

    Err(TimbreError::MissingFile {
        reason: "request has no 'file' field".to_string(),
    })
}

/// `GET /download`: the most recently transformed clip.
pub async fn download_latest(State(state): State<Arc<AppState>>) -> Result<Response> {
    let record = state
        .store
        .latest()?
        .ok_or_else(|| TimbreError::OutputNotFound {
            reason: "no conversion has completed yet".to_string(),
        })?;
    serve_record(record).await
}

/// `GET /download/{id}`: a transformed clip by conversion id.
pub async fn download_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    let record = state
        .store
        .get(&id)?
        .ok_or_else(|| TimbreError::OutputNotFound {
            reason: format!("no conversion with id {id}"),
        })?;
    serve_record(record).await
}

/// Read a record's WAV from disk and wrap it as an attachment.
async fn serve_record(record: ConversionRecord) -> Result<Response> {
    let bytes =
        tokio::fs::read(&record.output_path)
            .await
            .map_err(|e| TimbreError::OutputNotFound {
                reason: format!(
                    "output file {} unavailable: {e}",
                    record.output_path.display()
                ),
            })?;

    let headers = [
        (header::CONTENT_TYPE, "audio/wav".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", record.download_name()),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// `DELETE /cleanup/{id}`: forget a conversion and delete its file.
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CleanupResponse>> {
    let record = state
        .store
        .remove(&id)?
        .ok_or_else(|| TimbreError::OutputNotFound {
            reason: format!("no conversion with id {id}"),
        })?;

    if let Err(e) = tokio::fs::remove_file(&record.output_path).await {
        warn!(
            "cleanup {}: could not remove {}: {}",
            id,
            record.output_path.display(),
            e
        );
    }
    info!("cleaned up conversion {}", id);

    Ok(Json(CleanupResponse { removed: record.id }))
}

/// `POST /rescan`: re-read the models directory and return the fresh
/// listing.
pub async fn rescan(State(state): State<Arc<AppState>>) -> Result<Json<ModelsResponse>> {
    state.registry.scan()?;
    let models = state.registry.list()?;
    Ok(Json(ModelsResponse { models }))
}

/// `GET /info`: server and registry summary.
pub async fn server_info(State(state): State<Arc<AppState>>) -> Result<Json<ServerInfo>> {
    Ok(Json(ServerInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        models_dir: state.registry.models_dir().display().to_string(),
        model_count: state.registry.count()?,
        selected_model: state.registry.selected()?,
        output_sample_rate: MODEL_SAMPLE_RATE,
        conversions: state.store.count()?,
    }))
}
