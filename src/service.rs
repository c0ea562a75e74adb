//! One-shot prediction service.
//!
//! Validates a whole pre-collected landmark sequence, runs it through
//! normalize -> scale -> classify and returns a structured reply. No state is
//! kept between calls, so there is no voting on this path.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::PipelineResult;
use crate::models::InferenceEngine;
use crate::types::{MetadataResponse, PredictResponse, PredictionResult};

/// Stateless façade over the shared inference engine
#[derive(Clone)]
pub struct PredictionService {
    engine: Arc<InferenceEngine>,
}

impl PredictionService {
    pub fn new(engine: Arc<InferenceEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Classify a flat landmark list. Never fails: validation and inference
    /// errors come back as an error payload.
    pub fn predict(&self, landmarks: &[f32]) -> PredictResponse {
        match self.try_predict(landmarks) {
            Ok(result) => PredictResponse::Prediction(result),
            Err(e) => {
                warn!(error = %e, values = landmarks.len(), "Prediction request rejected");
                PredictResponse::error(e.to_string())
            }
        }
    }

    /// Classify a flat landmark list, surfacing the typed error
    pub fn try_predict(&self, landmarks: &[f32]) -> PipelineResult<PredictionResult> {
        let start = Instant::now();

        let seq = self.engine.normalizer().normalize_flat(landmarks)?;
        let classification = self.engine.classify(&seq)?;
        let result = PredictionResult::new(classification.index, classification.confidence);

        debug!(
            frames = landmarks.len() / self.engine.features_per_frame(),
            letter = %result.letter,
            index = result.index,
            confidence = result.confidence,
            processing_time_us = start.elapsed().as_micros(),
            "One-shot prediction complete"
        );

        Ok(result)
    }

    /// Shapes the service expects, for clients building requests
    pub fn metadata(&self) -> MetadataResponse {
        self.engine.metadata().response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inference::tests::{frame_for_class, stub_engine};
    use crate::types::FEATURES_PER_FRAME;

    fn service() -> PredictionService {
        PredictionService::new(Arc::new(stub_engine(30)))
    }

    #[test]
    fn test_empty_input_is_error_payload() {
        let response = service().predict(&[]);
        assert_eq!(response, PredictResponse::error("No landmarks provided."));
    }

    #[test]
    fn test_bad_length_mentions_divisor() {
        let response = service().predict(&[0.0; 100]);
        match response {
            PredictResponse::Error { error } => {
                assert!(error.contains("63"), "unexpected message: {error}");
                assert!(error.contains("100"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_sequence_is_padded() {
        let landmarks: Vec<f32> = (0..10).flat_map(|_| frame_for_class(2)).collect();
        let result = service().try_predict(&landmarks).unwrap();
        assert_eq!(result.index, 2);
        assert_eq!(result.letter, "B");
    }

    #[test]
    fn test_long_sequence_uses_last_frame() {
        // downsampling always keeps the final frame
        let mut landmarks: Vec<f32> = (0..44).flat_map(|_| frame_for_class(1)).collect();
        landmarks.extend(frame_for_class(26));
        assert_eq!(landmarks.len(), 45 * FEATURES_PER_FRAME);

        let response = service().predict(&landmarks);
        let result = response.prediction().unwrap();
        assert_eq!(result.letter, "Z");
    }

    #[test]
    fn test_position_does_not_matter() {
        let shifted: Vec<f32> = frame_for_class(5).iter().map(|v| v + 3.0).collect();
        let a = service().try_predict(&frame_for_class(5)).unwrap();
        let b = service().try_predict(&shifted).unwrap();
        assert_eq!(a.index, b.index);
    }

    #[test]
    fn test_metadata() {
        let metadata = service().metadata();
        assert_eq!(metadata.seq_len, 30);
        assert_eq!(metadata.features_per_frame, 63);
        assert_eq!(metadata.num_classes, 27);
    }
}
