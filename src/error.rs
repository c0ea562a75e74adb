//! Per-request error types for the inference pipeline.
//!
//! Startup failures use `anyhow` and abort the process; everything in here is
//! recoverable and gets converted into a structured error reply.

/// Recoverable errors raised while preparing or classifying a sequence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("No landmarks provided.")]
    EmptyInput,

    #[error("Expected landmarks multiple of {expected}, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("Expected frame of {expected} features, got {actual}")]
    FrameShape { expected: usize, actual: usize },

    #[error("Scaler expects {expected} features per frame, got {actual}")]
    ScalerMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid request: {0}")]
    InvalidMessage(String),
}

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn invalid_sample(msg: impl Into<String>) -> Self {
        Self::InvalidSample(msg.into())
    }

    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::InvalidMessage(msg.into())
    }
}
