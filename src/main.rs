//! Timbre server binary
//!
//! Parses flags, initializes logging and the ONNX runtime, scans the
//! models directory once, then serves the HTTP API.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use timbre::config::ServerConfig;
use timbre::model::{ModelRegistry, OrtConverter};
use timbre::pipeline::ConversionPipeline;
use timbre::server::{self, AppState};
use timbre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("timbre=info,tower_http=info")),
        )
        .init();

    info!("timbre-server v{}", env!("CARGO_PKG_VERSION"));

    let converter = OrtConverter::new()?;
    let registry = ModelRegistry::new(&config.models_dir);
    let found = registry.scan()?;
    if found == 0 {
        warn!(
            "no models in {}; uploads will fail until a rescan finds one",
            config.models_dir.display()
        );
    }

    let pipeline = ConversionPipeline::new(&config.work_dir, Arc::new(converter))?;
    let state = Arc::new(AppState::new(registry, pipeline));

    server::serve(&config, state).await
}
