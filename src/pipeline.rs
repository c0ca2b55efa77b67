//! Conversion pipeline and result store
//!
//! Everything that happens to an upload between the multipart field and
//! the downloadable WAV: save to a per-request scratch file, decode to
//! mono, resample to the model rate, run the model, write the output.
//! Completed conversions are tracked in an in-memory store keyed by
//! request id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::audio::{self, Waveform};
use crate::error::{Result, TimbreError};
use crate::model::Converter;

/// Sample rate every model consumes and produces
pub const MODEL_SAMPLE_RATE: u32 = 44_100;

/// A completed conversion available for download
#[derive(Debug, Clone)]
pub struct ConversionRecord {
    pub id: String,
    pub model: String,
    pub output_path: PathBuf,
    pub sample_rate: u32,
    pub num_samples: usize,
    pub elapsed_ms: u64,
}

impl ConversionRecord {
    /// Duration of the transformed clip in seconds
    pub fn duration_secs(&self) -> f32 {
        self.num_samples as f32 / self.sample_rate as f32
    }

    /// Filename offered to download clients
    pub fn download_name(&self) -> String {
        format!("transformed_{}.wav", self.id)
    }
}

/// Runs uploads through decode, resample, inference and encode
pub struct ConversionPipeline {
    work_dir: PathBuf,
    converter: Arc<dyn Converter>,
}

impl ConversionPipeline {
    /// Create a pipeline keeping scratch and output files in `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>, converter: Arc<dyn Converter>) -> Result<Self> {
        let work_dir = work_dir.into();
        std::fs::create_dir_all(&work_dir)?;
        Ok(Self {
            work_dir,
            converter,
        })
    }

    /// Generate a fresh conversion id
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Persist uploaded bytes to the per-request scratch path
    ///
    /// The extension of the client filename is kept (sanitized) so the
    /// decoder can use it as a format hint. The write is verified
    /// before the path is handed on.
    pub fn store_upload(&self, id: &str, client_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let extension = sanitize_extension(client_name);
        let path = self.work_dir.join(format!("received_{id}.{extension}"));

        std::fs::write(&path, bytes).map_err(|e| TimbreError::SaveFailed {
            path: path.display().to_string(),
            source: Some(e),
        })?;

        let metadata = std::fs::metadata(&path).map_err(|e| TimbreError::SaveFailed {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        if metadata.len() != bytes.len() as u64 {
            return Err(TimbreError::SaveFailed {
                path: path.display().to_string(),
                source: None,
            });
        }

        info!("stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Decode, resample, convert and encode one upload
    ///
    /// The scratch file is removed as soon as decoding is over, whether
    /// it succeeded or not. On success the output WAV sits at the
    /// returned record's `output_path`.
    pub fn convert(
        &self,
        id: &str,
        model_name: &str,
        model_path: &Path,
        upload_path: &Path,
    ) -> Result<ConversionRecord> {
        let start = Instant::now();

        let decoded = audio::decode_file(upload_path);
        if let Err(e) = std::fs::remove_file(upload_path) {
            warn!(
                "failed to remove scratch file {}: {}",
                upload_path.display(),
                e
            );
        }
        let decoded = decoded?;

        let wave = audio::to_rate(decoded, MODEL_SAMPLE_RATE)?;
        info!(
            "running model '{}' on {} samples ({:.2}s)",
            model_name,
            wave.len(),
            wave.duration_secs()
        );
        let converted = self.run_model(model_path, &wave)?;

        let output_path = self.work_dir.join(format!("transformed_{id}.wav"));
        audio::write_wav(&converted, &output_path)?;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            "conversion {} finished in {} ms ({} samples out)",
            id,
            elapsed_ms,
            converted.len()
        );

        Ok(ConversionRecord {
            id: id.to_string(),
            model: model_name.to_string(),
            output_path,
            sample_rate: converted.sample_rate(),
            num_samples: converted.len(),
            elapsed_ms,
        })
    }

    fn run_model(&self, model_path: &Path, wave: &Waveform) -> Result<Waveform> {
        let converted = self.converter.convert(model_path, wave)?;
        if converted.is_empty() {
            return Err(TimbreError::InferenceFailed {
                reason: "model produced an empty waveform".to_string(),
            });
        }
        Ok(converted)
    }
}

/// Extension of the uploaded filename, reduced to safe characters
///
/// Falls back to "bin" when the name carries no usable extension; the
/// decoder probes by content in that case.
fn sanitize_extension(client_name: &str) -> String {
    let extension = Path::new(client_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let cleaned: String = extension
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_lowercase();

    if cleaned.is_empty() {
        "bin".to_string()
    } else {
        cleaned
    }
}

/// In-memory index of completed conversions
#[derive(Default)]
pub struct ConversionStore {
    state: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    latest: Option<ConversionRecord>,
    by_id: HashMap<String, ConversionRecord>,
}

impl ConversionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed conversion as both addressable and latest
    pub fn insert(&self, record: ConversionRecord) -> Result<()> {
        let mut state = self.write_state()?;
        state.by_id.insert(record.id.clone(), record.clone());
        state.latest = Some(record);
        Ok(())
    }

    /// Most recent successful conversion
    pub fn latest(&self) -> Result<Option<ConversionRecord>> {
        Ok(self.read_state()?.latest.clone())
    }

    /// Look up a conversion by id
    pub fn get(&self, id: &str) -> Result<Option<ConversionRecord>> {
        Ok(self.read_state()?.by_id.get(id).cloned())
    }

    /// Drop a conversion record, returning it so the caller can remove
    /// the file
    ///
    /// Removing the latest conversion clears the latest pointer rather
    /// than resurrecting an older result.
    pub fn remove(&self, id: &str) -> Result<Option<ConversionRecord>> {
        let mut state = self.write_state()?;
        let removed = state.by_id.remove(id);
        if removed.is_some() && state.latest.as_ref().map(|r| r.id.as_str()) == Some(id) {
            state.latest = None;
        }
        Ok(removed)
    }

    /// Number of conversions currently tracked
    pub fn count(&self) -> Result<usize> {
        Ok(self.read_state()?.by_id.len())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| TimbreError::Internal {
            reason: "conversion store lock poisoned".to_string(),
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| TimbreError::Internal {
            reason: "conversion store lock poisoned".to_string(),
        })
    }
}
