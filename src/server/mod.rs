//! HTTP surface
//!
//! Shared state, router assembly and the serve loop. Routes mirror the
//! client contract exactly, including the legacy mixed-case
//! `/selectModel` path.

pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::model::ModelRegistry;
use crate::pipeline::{ConversionPipeline, ConversionStore};

/// Everything the handlers share, kept behind one `Arc`.
pub struct AppState {
    pub registry: ModelRegistry,
    pub pipeline: ConversionPipeline,
    pub store: ConversionStore,
}

impl AppState {
    pub fn new(registry: ModelRegistry, pipeline: ConversionPipeline) -> Self {
        Self {
            registry,
            pipeline,
            store: ConversionStore::new(),
        }
    }
}

/// Assemble the application router.
pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/download", get(handlers::download_latest))
        .route("/download/:id", get(handlers::download_by_id))
        .route("/getmodels", get(handlers::get_models))
        .route("/selectModel/:model_name", get(handlers::select_model))
        .route("/rescan", post(handlers::rescan))
        .route("/cleanup/:id", delete(handlers::cleanup))
        .route("/info", get(handlers::server_info))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for browser clients: the request origin is mirrored back with
/// credentials allowed. Credentialed responses cannot use wildcards,
/// hence the explicit method and header lists.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Bind the configured address and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state, config.max_upload_bytes());
    let addr = config.socket_addr();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
