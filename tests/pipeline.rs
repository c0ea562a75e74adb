//! End-to-end checks of the one-shot and live paths with a substitute classifier.

use std::sync::Arc;

use fingerspell_pipeline::config::LiveConfig;
use fingerspell_pipeline::models::{Classifier, InferenceEngine, Metadata, StandardScaler};
use fingerspell_pipeline::types::{LiveFrame, PredictResponse, FEATURES_PER_FRAME};
use fingerspell_pipeline::{PredictionService, SessionRegistry};

/// Picks the class from how far the index fingertip (landmark 8) sits above
/// the wrist in the last frame, in tenths.
struct FingertipClassifier;

impl Classifier for FingertipClassifier {
    fn name(&self) -> &str {
        "fingertip"
    }

    fn predict_proba(
        &self,
        input: &[f32],
        seq_len: usize,
        features_per_frame: usize,
    ) -> anyhow::Result<Vec<f32>> {
        let last = &input[(seq_len - 1) * features_per_frame..];
        let height = -last[8 * 3 + 1];
        let class = ((height * 10.0).round().max(0.0) as usize).min(26);

        let mut probs = vec![0.0; 27];
        probs[class] = 0.8;
        probs[(class + 1) % 27] = 0.2;
        Ok(probs)
    }
}

fn engine() -> Arc<InferenceEngine> {
    let engine = InferenceEngine::from_parts(
        Metadata::new(30, FEATURES_PER_FRAME, 27),
        StandardScaler::identity(FEATURES_PER_FRAME),
        Box::new(FingertipClassifier),
    )
    .expect("engine");
    Arc::new(engine)
}

/// Hand at `(wx, wy)` with the index fingertip `class / 10` above the wrist
fn hand(wx: f32, wy: f32, class: usize) -> Vec<f32> {
    let mut values = Vec::with_capacity(FEATURES_PER_FRAME);
    for _ in 0..21 {
        values.extend([wx, wy, 0.0]);
    }
    values[8 * 3 + 1] = wy - class as f32 / 10.0;
    values
}

#[test]
fn one_shot_prediction_is_position_invariant() {
    let service = PredictionService::new(engine());

    let near: Vec<f32> = (0..12).flat_map(|_| hand(0.2, 0.9, 3)).collect();
    let far: Vec<f32> = (0..70).flat_map(|_| hand(0.8, 0.4, 3)).collect();

    for landmarks in [near, far] {
        match service.predict(&landmarks) {
            PredictResponse::Prediction(result) => {
                assert_eq!(result.index, 3);
                assert_eq!(result.letter, "C");
                assert!((result.confidence - 0.8).abs() < 1e-6);
            }
            PredictResponse::Error { error } => panic!("unexpected error: {error}"),
        }
    }
}

#[test]
fn one_shot_errors_are_payloads() {
    let service = PredictionService::new(engine());

    let empty = serde_json::to_value(service.predict(&[])).unwrap();
    assert_eq!(empty["error"], "No landmarks provided.");

    let ragged = serde_json::to_value(service.predict(&[0.1; 130])).unwrap();
    let message = ragged["error"].as_str().unwrap();
    assert!(message.contains("63"));
}

#[test]
fn live_session_stabilizes_letter() {
    let engine = engine();
    let mut registry = SessionRegistry::new(&LiveConfig {
        vote_window: 8,
        reset_after_misses: 0,
        session_idle_secs: 60,
    });

    let tick = |landmarks: Option<Vec<f32>>| LiveFrame {
        session_id: "cam".to_string(),
        landmarks,
    };

    // filling: 29 frames produce nothing
    for _ in 0..29 {
        assert!(registry
            .handle(&engine, tick(Some(hand(0.5, 0.5, 1))))
            .unwrap()
            .is_none());
    }

    let mut letters = Vec::new();
    for i in 0..6 {
        let event = registry
            .handle(&engine, tick(Some(hand(0.5, 0.5, 1))))
            .unwrap()
            .expect("window full");
        letters.push(event.letter.clone());

        // a dropped detection between frames changes nothing
        if i == 2 {
            assert!(registry.handle(&engine, tick(None)).unwrap().is_none());
        }
    }
    assert!(letters.iter().all(|l| l == "A"));

    // a brief flicker to another sign is voted away
    let event = registry
        .handle(&engine, tick(Some(hand(0.5, 0.5, 2))))
        .unwrap()
        .unwrap();
    assert_eq!(event.frame_index, 2);
    assert_eq!(event.letter, "A");

    // a sustained change eventually wins the vote
    let mut last = String::new();
    for _ in 0..8 {
        last = registry
            .handle(&engine, tick(Some(hand(0.5, 0.5, 2))))
            .unwrap()
            .unwrap()
            .letter;
    }
    assert_eq!(last, "B");
}
