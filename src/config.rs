//! Server configuration
//!
//! Command-line configuration for the Timbre inference server.

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Timbre Server - neural voice conversion over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "timbre-server")]
#[command(version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to bind the listener on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Directory scanned for .onnx voice models
    #[arg(long, default_value = "./models")]
    pub models_dir: PathBuf,

    /// Directory where uploaded and transformed audio files are kept
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value_t = 64)]
    pub max_upload_mb: usize,
}

impl ServerConfig {
    /// Socket address the server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Upload cap in bytes, fed to the request body limit
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
