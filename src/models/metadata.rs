//! Model metadata written by training alongside the model artifacts

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::landmarks::COORDS_PER_LANDMARK;
use crate::types::MetadataResponse;

fn default_model_path() -> String {
    "asl_sequence_classifier.onnx".to_string()
}

fn default_scaler_path() -> String {
    "scaler.json".to_string()
}

/// Immutable shape and artifact description, loaded once at startup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    /// Frames per model input
    pub seq_len: usize,
    /// Values per frame (21 landmarks x 3 coords)
    pub features_per_frame: usize,
    /// Number of output classes (0 when training did not record it)
    #[serde(default)]
    pub num_classes: usize,
    /// Classifier file, relative to the models directory
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Scaler file, relative to the models directory
    #[serde(default = "default_scaler_path")]
    pub scaler_path: String,
}

/// Absolute locations of the artifacts, checked to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl Metadata {
    /// Create metadata with default artifact names
    pub fn new(seq_len: usize, features_per_frame: usize, num_classes: usize) -> Self {
        Self {
            seq_len,
            features_per_frame,
            num_classes,
            model_path: default_model_path(),
            scaler_path: default_scaler_path(),
        }
    }

    /// Load and validate metadata from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!(
                "Missing {}. Run training first so metadata is created.",
                path.display()
            );
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata from {}", path.display()))?;
        let metadata: Metadata = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse metadata in {}", path.display()))?;
        metadata.validate()?;

        info!(
            seq_len = metadata.seq_len,
            features_per_frame = metadata.features_per_frame,
            num_classes = metadata.num_classes,
            "Model metadata loaded"
        );

        Ok(metadata)
    }

    /// Check the shape values are usable
    pub fn validate(&self) -> Result<()> {
        if self.seq_len == 0 {
            bail!("metadata seq_len must be greater than zero");
        }
        if self.features_per_frame == 0 || self.features_per_frame % COORDS_PER_LANDMARK != 0 {
            bail!(
                "metadata features_per_frame must be a positive multiple of {}, got {}",
                COORDS_PER_LANDMARK,
                self.features_per_frame
            );
        }
        Ok(())
    }

    /// Resolve artifact paths against the models directory; both files must exist
    pub fn resolve_artifacts<P: AsRef<Path>>(&self, models_dir: P) -> Result<ArtifactPaths> {
        let models_dir = models_dir.as_ref();
        let model = models_dir.join(&self.model_path);
        let scaler = models_dir.join(&self.scaler_path);

        if !model.exists() {
            bail!("Model not found: {}", model.display());
        }
        if !scaler.exists() {
            bail!("Scaler not found: {}", scaler.display());
        }

        Ok(ArtifactPaths { model, scaler })
    }

    /// Public view returned by the metadata endpoint
    pub fn response(&self) -> MetadataResponse {
        MetadataResponse {
            seq_len: self.seq_len,
            features_per_frame: self.features_per_frame,
            num_classes: self.num_classes,
        }
    }
}
