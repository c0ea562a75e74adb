//! Model artifacts and inference

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod metadata;
pub mod scaler;

pub use classifier::{Classifier, OnnxClassifier};
pub use inference::{Classification, InferenceEngine};
pub use loader::ModelLoader;
pub use metadata::Metadata;
pub use scaler::StandardScaler;
