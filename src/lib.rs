//! Fingerspelling Pipeline Library
//!
//! Turns streams of hand-landmark coordinates into stabilized sign-language
//! letter classifications: sequence normalization, ONNX classification and
//! majority-vote smoothing for live sessions.

pub mod config;
pub mod consumer;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod producer;
pub mod service;
pub mod streaming;
pub mod types;

pub use config::AppConfig;
pub use consumer::LandmarkConsumer;
pub use error::{PipelineError, PipelineResult};
pub use models::inference::InferenceEngine;
pub use normalizer::SequenceNormalizer;
pub use producer::LetterProducer;
pub use service::PredictionService;
pub use streaming::{LiveSessions, SessionRegistry, StreamingPredictor, TemporalVoter};
pub use types::{LetterEvent, LiveFrame, PredictResponse, PredictionResult};
