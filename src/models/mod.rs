//! Classifier artifact loading and inference

pub mod classifier;
pub mod inference;
pub mod loader;

pub use classifier::{Classifier, OnnxClassifier};
pub use inference::InferenceService;
pub use loader::{ArtifactLoader, OnnxLoader};
