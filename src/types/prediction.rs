//! Request, reply and event payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::labels::letter_for;

/// One-shot prediction request: a whole landmark sequence, flattened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub landmarks: Vec<f32>,
}

/// Classified letter for one inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Display letter (`?` for an index outside the table)
    pub letter: String,
    /// Probability of the winning class (0.0 - 1.0)
    pub confidence: f32,
    /// Winning class index
    pub index: usize,
}

impl PredictionResult {
    pub fn new(index: usize, confidence: f32) -> Self {
        Self {
            letter: letter_for(index).to_string(),
            confidence,
            index,
        }
    }
}

/// Reply to a one-shot request: either a result or an error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Prediction(PredictionResult),
    Error { error: String },
}

impl PredictResponse {
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { error: msg.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        match self {
            Self::Prediction(result) => Some(result),
            Self::Error { .. } => None,
        }
    }
}

/// Reply to a metadata request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub seq_len: usize,
    pub features_per_frame: usize,
    pub num_classes: usize,
}

/// One tick of a live session. `landmarks` is absent when no hand was detected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveFrame {
    pub session_id: String,
    #[serde(default)]
    pub landmarks: Option<Vec<f32>>,
}

/// Stabilized letter published after each live inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterEvent {
    pub session_id: String,

    /// Letter for the voted class
    pub letter: String,

    /// Voted (stabilized) class index
    pub index: usize,

    /// Confidence of the current frame's prediction
    pub confidence: f32,

    /// Class index predicted for the current frame alone
    pub frame_index: usize,

    pub timestamp: DateTime<Utc>,
}

impl LetterEvent {
    pub fn new(session_id: String, index: usize, frame_index: usize, confidence: f32) -> Self {
        Self {
            session_id,
            letter: letter_for(index).to_string(),
            index,
            confidence,
            frame_index,
            timestamp: Utc::now(),
        }
    }
}
