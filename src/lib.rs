//! Cardiovascular Risk Pipeline Library
//!
//! Encodes patient health metrics into the feature vector a trained
//! classifier expects and turns the classifier's output into a
//! low/high risk verdict.

pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_encoder;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod types;

pub use config::AppConfig;
pub use consumer::RecordConsumer;
pub use error::{InferenceError, ModelLoadError, PipelineError, ValidationError};
pub use feature_encoder::{AgeUnit, FeatureEncoder, FeatureVector};
pub use models::inference::InferenceService;
pub use pipeline::{RequestState, RiskPipeline};
pub use producer::ReportProducer;
pub use types::{patient::PatientRecord, patient::RawInput, report::Outcome, report::Verdict};
