//! Inference engine: the shared, read-only model context

use anyhow::{bail, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::classifier::{Classifier, OnnxClassifier};
use crate::models::metadata::Metadata;
use crate::models::scaler::StandardScaler;
use crate::normalizer::SequenceNormalizer;
use crate::types::NormalizedSequence;

/// Arg-max of one classifier call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Winning class index
    pub index: usize,
    /// Probability of the winning class
    pub confidence: f32,
}

impl Classification {
    /// Pick the most probable class; the first maximum wins on ties
    pub fn from_probabilities(probs: &[f32]) -> Option<Self> {
        let mut best: Option<Classification> = None;
        for (index, &p) in probs.iter().enumerate() {
            match best {
                Some(b) if p <= b.confidence => {}
                _ => {
                    best = Some(Classification {
                        index,
                        confidence: p,
                    })
                }
            }
        }
        best
    }
}

/// Metadata, scaler and classifier loaded once at startup and shared by reference
pub struct InferenceEngine {
    metadata: Metadata,
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
    normalizer: SequenceNormalizer,
}

impl InferenceEngine {
    /// Load every artifact named by the configuration; any missing piece is fatal
    pub fn new(config: &AppConfig) -> Result<Self> {
        let models_dir = Path::new(&config.models.models_dir);
        let metadata = Metadata::load(models_dir.join(&config.models.metadata_file))?;
        let paths = metadata.resolve_artifacts(models_dir)?;

        let scaler = StandardScaler::load(&paths.scaler)?;
        let classifier = OnnxClassifier::load(&paths.model, config.models.onnx_threads)?;

        Self::from_parts(metadata, scaler, Box::new(classifier))
    }

    /// Assemble an engine from already-loaded parts
    pub fn from_parts(
        metadata: Metadata,
        scaler: StandardScaler,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self> {
        metadata.validate()?;
        if scaler.feature_count() != metadata.features_per_frame {
            bail!(
                "Scaler has {} features but metadata expects {} per frame",
                scaler.feature_count(),
                metadata.features_per_frame
            );
        }

        let normalizer = SequenceNormalizer::new(metadata.seq_len, metadata.features_per_frame);

        info!(
            classifier = %classifier.name(),
            seq_len = metadata.seq_len,
            features_per_frame = metadata.features_per_frame,
            num_classes = metadata.num_classes,
            "Inference engine initialized"
        );

        Ok(Self {
            metadata,
            scaler,
            classifier,
            normalizer,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn normalizer(&self) -> &SequenceNormalizer {
        &self.normalizer
    }

    pub fn seq_len(&self) -> usize {
        self.metadata.seq_len
    }

    pub fn features_per_frame(&self) -> usize {
        self.metadata.features_per_frame
    }

    /// Scale a wrist-relative sequence and run the classifier once
    pub fn classify(&self, seq: &NormalizedSequence) -> PipelineResult<Classification> {
        if seq.len() != self.metadata.seq_len {
            return Err(PipelineError::inference(format!(
                "expected {} frames, got {}",
                self.metadata.seq_len,
                seq.len()
            )));
        }

        let scaled = self.scaler.transform(seq)?;
        let probs = self
            .classifier
            .predict_proba(
                &scaled,
                self.metadata.seq_len,
                self.metadata.features_per_frame,
            )
            .map_err(|e| PipelineError::inference(e.to_string()))?;

        let classification = Classification::from_probabilities(&probs)
            .ok_or_else(|| PipelineError::inference("classifier returned no probabilities"))?;

        debug!(
            index = classification.index,
            confidence = classification.confidence,
            classes = probs.len(),
            "Sequence classified"
        );

        Ok(classification)
    }
}
