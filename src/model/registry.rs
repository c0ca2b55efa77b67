//! Voice model registry
//!
//! Tracks the .onnx files under the models directory and which one is
//! currently selected. The directory is scanned once at startup and
//! again only on an explicit rescan, so listings stay stable between
//! scans no matter what happens on disk.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use crate::error::{Result, TimbreError};

/// File extension a model must carry to be listed
pub const MODEL_EXTENSION: &str = "onnx";

/// Registry of voice conversion models on disk
pub struct ModelRegistry {
    models_dir: PathBuf,
    state: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    models: Vec<String>,
    selected: Option<String>,
}

impl ModelRegistry {
    /// Create an empty registry over a models directory
    ///
    /// The registry is unusable until `scan` has run once.
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Directory this registry scans
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Scan the models directory, replacing the cached listing
    ///
    /// Keeps the current selection when its file is still listed,
    /// otherwise drops it so the new first entry takes over. Returns
    /// the number of models found.
    pub fn scan(&self) -> Result<usize> {
        let entries =
            std::fs::read_dir(&self.models_dir).map_err(|e| TimbreError::ModelDirUnreadable {
                path: self.models_dir.display().to_string(),
                source: e,
            })?;

        let mut models = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TimbreError::ModelDirUnreadable {
                path: self.models_dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(MODEL_EXTENSION)
            {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    models.push(name.to_string());
                }
            }
        }
        models.sort();

        let mut state = self.write_state()?;
        if let Some(current) = state.selected.take() {
            if models.contains(&current) {
                state.selected = Some(current);
            } else {
                warn!("selected model '{}' gone after rescan", current);
            }
        }
        state.models = models;
        info!(
            "scanned {}: {} model(s)",
            self.models_dir.display(),
            state.models.len()
        );
        Ok(state.models.len())
    }

    /// Cached model listing, in sorted order
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.read_state()?.models.clone())
    }

    /// Number of models in the cached listing
    pub fn count(&self) -> Result<usize> {
        Ok(self.read_state()?.models.len())
    }

    /// Effective selection: the explicitly selected model, or the first
    /// scanned entry when none was selected
    pub fn selected(&self) -> Result<Option<String>> {
        let state = self.read_state()?;
        Ok(state.selected.clone().or_else(|| state.models.first().cloned()))
    }

    /// Select a model by name, with or without the `.onnx` extension
    ///
    /// The extension is appended before the lookup, so `b` and `b.onnx`
    /// select the same model. On a miss the previous selection stays.
    pub fn select(&self, name: &str) -> Result<String> {
        let candidate = normalize_name(name);
        let mut state = self.write_state()?;
        if !state.models.contains(&candidate) {
            return Err(TimbreError::ModelNotFound { model: candidate });
        }
        info!("selected model '{}'", candidate);
        state.selected = Some(candidate.clone());
        Ok(candidate)
    }

    /// Resolve the effective selection to a name and an on-disk path
    ///
    /// This is the per-request snapshot: a conversion keeps using the
    /// returned path even if the selection changes while it runs.
    pub fn selected_snapshot(&self) -> Result<(String, PathBuf)> {
        let name = self
            .selected()?
            .ok_or_else(|| TimbreError::NoModelsAvailable {
                dir: self.models_dir.display().to_string(),
            })?;
        let path = self.models_dir.join(&name);
        Ok((name, path))
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, RegistryState>> {
        self.state.read().map_err(|_| TimbreError::Internal {
            reason: "model registry lock poisoned".to_string(),
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, RegistryState>> {
        self.state.write().map_err(|_| TimbreError::Internal {
            reason: "model registry lock poisoned".to_string(),
        })
    }
}

/// Append the model extension when the name lacks it
fn normalize_name(name: &str) -> String {
    if Path::new(name).extension().and_then(|e| e.to_str()) == Some(MODEL_EXTENSION) {
        name.to_string()
    } else {
        format!("{}.{}", name, MODEL_EXTENSION)
    }
}
