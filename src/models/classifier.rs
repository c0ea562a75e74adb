//! Sequence classifier abstraction and its ONNX Runtime implementation

use anyhow::{Context, Result};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use crate::models::loader::{LoadedModel, ModelLoader};

/// Trained model mapping a scaled `[seq_len, features]` sequence to class probabilities.
///
/// Implementations are shared read-only across requests, so they must be
/// `Send + Sync` and serialize any internal mutable state themselves.
pub trait Classifier: Send + Sync {
    /// Human-readable model name for logs
    fn name(&self) -> &str;

    /// Class probabilities for one sequence given as row-major values
    fn predict_proba(
        &self,
        input: &[f32],
        seq_len: usize,
        features_per_frame: usize,
    ) -> Result<Vec<f32>>;
}

/// Classifier backed by an ONNX Runtime session.
///
/// Running a session needs exclusive access, so calls are serialized by a mutex.
pub struct OnnxClassifier {
    model: Mutex<LoadedModel>,
    name: String,
}

impl OnnxClassifier {
    /// Load the classifier from an ONNX file
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let loader = ModelLoader::with_threads(onnx_threads);
        let model = loader.load_model(path, "asl_sequence_classifier")?;
        Ok(Self::from_model(model))
    }

    pub fn from_model(model: LoadedModel) -> Self {
        let name = model.name.clone();
        Self {
            model: Mutex::new(model),
            name,
        }
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(
        &self,
        input: &[f32],
        seq_len: usize,
        features_per_frame: usize,
    ) -> Result<Vec<f32>> {
        // Input tensor - shape [1, seq_len, features]
        let shape = vec![1_i64, seq_len as i64, features_per_frame as i64];
        let input_tensor =
            Tensor::from_array((shape, input.to_vec())).context("Failed to create input tensor")?;

        let mut model = self
            .model
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let LoadedModel {
            session,
            input_name,
            output_name,
            ..
        } = &mut *model;

        let outputs = session.run(ort::inputs![input_name.as_str() => input_tensor])?;

        let output = outputs
            .get(output_name.as_str())
            .with_context(|| format!("Classifier produced no output named {output_name}"))?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .context("Classifier output is not a float tensor")?;

        debug!(model = %self.name, shape = ?shape, "Classifier output extracted");

        Ok(data.to_vec())
    }
}
