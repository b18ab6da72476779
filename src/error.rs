//! Error taxonomy for the risk pipeline.
//!
//! Each failure is detected where it originates and carried to the caller
//! unchanged. Nothing in the pipeline substitutes a default verdict.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a usable classifier artifact.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelLoadError {
    /// Path does not resolve to an existing regular file
    #[error("model file not found: {path}")]
    NotFound { path: PathBuf },

    /// File exists but could not be deserialized into a classifier
    #[error("model file {path} could not be loaded: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Raw input rejected before encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field `{field}` is zero or missing")]
    ZeroOrMissingField { field: &'static str },
}

/// Failure while running the classifier on an encoded vector.
///
/// `RuntimeFailure` carries no detail: the underlying error is logged where it
/// happens and the caller only sees a generic inference error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("inference failed")]
    RuntimeFailure,

    #[error("classifier returned unexpected class {0}")]
    UnexpectedClass(i64),
}

/// Machine-readable error kind for the output boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ModelNotFound,
    ModelCorrupt,
    ZeroOrMissingField,
    InferenceRuntimeFailure,
    UnexpectedClass,
}

/// Any error a single prediction request can end in.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PipelineError {
    /// Error kind reported alongside the message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ModelLoad(ModelLoadError::NotFound { .. }) => ErrorKind::ModelNotFound,
            PipelineError::ModelLoad(ModelLoadError::Corrupt { .. }) => ErrorKind::ModelCorrupt,
            PipelineError::Validation(ValidationError::ZeroOrMissingField { .. }) => {
                ErrorKind::ZeroOrMissingField
            }
            PipelineError::Inference(InferenceError::RuntimeFailure) => {
                ErrorKind::InferenceRuntimeFailure
            }
            PipelineError::Inference(InferenceError::UnexpectedClass(_)) => {
                ErrorKind::UnexpectedClass
            }
        }
    }

    /// Validation failures reject a request; everything else fails it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }

    /// Human-readable message for the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::ModelLoad(_) => {
                "Model is not loaded. Please ensure the model file is available.".to_string()
            }
            PipelineError::Validation(_) => {
                "Please enter valid non-zero values for all fields.".to_string()
            }
            PipelineError::Inference(_) => "Error during prediction.".to_string(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
