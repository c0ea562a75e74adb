//! Type definitions for the fingerspelling pipeline

pub mod labels;
pub mod landmarks;
pub mod prediction;

pub use labels::letter_for;
pub use landmarks::{Frame, Landmark, NormalizedSequence, RawSequence, FEATURES_PER_FRAME};
pub use prediction::{
    LetterEvent, LiveFrame, MetadataResponse, PredictRequest, PredictResponse, PredictionResult,
};
