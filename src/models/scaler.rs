//! Per-feature standardization fitted during training

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::types::NormalizedSequence;

/// Standard scaler: `(x - mean) / scale` per feature column.
///
/// The artifact is the fitted `mean` and `scale` vectors exported as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f32>,
    scale: Vec<f32>,
}

impl StandardScaler {
    /// Create a scaler, checking both vectors describe the same features
    pub fn new(mean: Vec<f32>, scale: Vec<f32>) -> Result<Self> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Scaler that leaves values unchanged
    pub fn identity(features: usize) -> Self {
        Self {
            mean: vec![0.0; features],
            scale: vec![1.0; features],
        }
    }

    /// Load a scaler artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scaler from {}", path.display()))?;
        let scaler: StandardScaler = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scaler in {}", path.display()))?;
        scaler.validate()?;

        info!(
            path = %path.display(),
            features = scaler.feature_count(),
            "Feature scaler loaded"
        );

        Ok(scaler)
    }

    fn validate(&self) -> Result<()> {
        if self.mean.is_empty() {
            bail!("scaler has no features");
        }
        if self.mean.len() != self.scale.len() {
            bail!(
                "scaler mean has {} features but scale has {}",
                self.mean.len(),
                self.scale.len()
            );
        }
        Ok(())
    }

    /// Number of feature columns
    pub fn feature_count(&self) -> usize {
        self.mean.len()
    }

    /// Scale every frame of the sequence; returns row-major values
    pub fn transform(&self, seq: &NormalizedSequence) -> PipelineResult<Vec<f32>> {
        let mut out = Vec::with_capacity(seq.len() * self.feature_count());

        for frame in seq.frames() {
            if frame.len() != self.feature_count() {
                return Err(PipelineError::ScalerMismatch {
                    expected: self.feature_count(),
                    actual: frame.len(),
                });
            }

            out.extend(
                frame
                    .values()
                    .iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(&x, (&mean, &scale))| {
                        // constant features were fitted with zero variance
                        let scale = if scale == 0.0 { 1.0 } else { scale };
                        (x - mean) / scale
                    }),
            );
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Frame;
    use tempfile::TempDir;

    fn sequence(rows: &[Vec<f32>]) -> NormalizedSequence {
        let frames = rows
            .iter()
            .map(|r| Frame::new(r.clone(), r.len()).unwrap())
            .collect();
        NormalizedSequence::from_frames(frames)
    }

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(vec![1.0, 2.0, 0.0], vec![2.0, 0.5, 1.0]).unwrap();
        let seq = sequence(&[vec![3.0, 2.5, -1.0], vec![1.0, 2.0, 0.0]]);

        let out = scaler.transform(&seq).unwrap();
        assert_eq!(out, vec![1.0, 1.0, -1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_scale_acts_as_one() {
        let scaler = StandardScaler::new(vec![1.0], vec![0.0]).unwrap();
        let out = scaler.transform(&sequence(&[vec![4.0]])).unwrap();
        assert_eq!(out, vec![3.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = StandardScaler::identity(3);
        let err = scaler.transform(&sequence(&[vec![1.0, 2.0]])).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ScalerMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_new_rejects_mismatched_vectors() {
        assert!(StandardScaler::new(vec![0.0; 3], vec![1.0; 2]).is_err());
        assert!(StandardScaler::new(Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn test_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scaler.json");
        std::fs::write(&path, r#"{"mean": [0.5, 1.0], "scale": [2.0, 4.0]}"#).unwrap();

        let scaler = StandardScaler::load(&path).unwrap();
        assert_eq!(scaler.feature_count(), 2);

        std::fs::write(&path, r#"{"mean": [0.5], "scale": [2.0, 4.0]}"#).unwrap();
        assert!(StandardScaler::load(&path).is_err());
    }
}
