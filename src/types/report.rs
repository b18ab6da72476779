//! Verdicts and per-request outcome reports

use crate::error::{ErrorKind, InferenceError, PipelineError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binary cardiovascular risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    LowRisk,
    HighRisk,
}

impl Verdict {
    /// Map the classifier's output class to a verdict.
    ///
    /// Only 0 and 1 are defined for this model.
    pub fn from_class(class: i64) -> Result<Self, InferenceError> {
        match class {
            0 => Ok(Verdict::LowRisk),
            1 => Ok(Verdict::HighRisk),
            other => Err(InferenceError::UnexpectedClass(other)),
        }
    }

    /// Message shown to the patient
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::LowRisk => "You have a low risk of heart disease.",
            Verdict::HighRisk => "Warning: You have a high risk of heart disease.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::LowRisk => "low_risk",
            Verdict::HighRisk => "high_risk",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful prediction report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// Unique report identifier
    pub report_id: String,

    /// Identifier of the originating record, if one was supplied
    pub record_id: Option<String>,

    pub verdict: Verdict,

    /// Human-readable verdict message
    pub message: String,

    /// Encoded feature vector that was classified
    pub features: Vec<f32>,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,

    /// End-to-end processing time in microseconds
    pub latency_us: u64,
}

impl RiskReport {
    pub fn new(record_id: Option<String>, verdict: Verdict, features: Vec<f32>) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            record_id,
            verdict,
            message: verdict.message().to_string(),
            features,
            timestamp: Utc::now(),
            latency_us: 0,
        }
    }

    pub fn with_latency_us(mut self, latency_us: u64) -> Self {
        self.latency_us = latency_us;
        self
    }
}

/// Structured error for a rejected or failed request
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub record_id: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(record_id: Option<String>, error: &PipelineError) -> Self {
        Self {
            record_id,
            kind: error.kind(),
            message: error.user_message(),
            timestamp: Utc::now(),
        }
    }
}

/// Terminal state of one request, as written to the output boundary
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Reported(RiskReport),
    Rejected(ErrorReport),
    Failed(ErrorReport),
}

impl Outcome {
    /// Build the outcome for a finished request.
    pub fn from_result(record_id: Option<String>, result: Result<RiskReport, PipelineError>) -> Self {
        match result {
            Ok(report) => Outcome::Reported(report),
            Err(e) if e.is_rejection() => Outcome::Rejected(ErrorReport::new(record_id, &e)),
            Err(e) => Outcome::Failed(ErrorReport::new(record_id, &e)),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Reported(_) => "reported",
            Outcome::Rejected(_) => "rejected",
            Outcome::Failed(_) => "failed",
        }
    }
}
