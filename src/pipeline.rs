//! Request pipeline: validate, encode, classify, report.
//!
//! Each request runs to completion on the calling thread before the next
//! one is accepted.

use crate::config::ModelConfig;
use crate::error::PipelineError;
use crate::feature_encoder::FeatureEncoder;
use crate::metrics::PipelineMetrics;
use crate::models::inference::InferenceService;
use crate::types::patient::{PatientRecord, RawInput};
use crate::types::report::{Outcome, RiskReport};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Lifecycle of a single prediction request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Collected,
    Validated,
    Encoded,
    Predicted,
    Reported,
    Rejected,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Reported | RequestState::Rejected | RequestState::Failed
        )
    }
}

/// Tracks the state of one request as it moves through the pipeline
struct RequestTrace<'a> {
    record_id: Option<&'a str>,
    state: RequestState,
}

impl<'a> RequestTrace<'a> {
    fn new(record_id: Option<&'a str>) -> Self {
        Self {
            record_id,
            state: RequestState::Collected,
        }
    }

    fn advance(&mut self, next: RequestState) {
        trace!(
            record_id = self.record_id.unwrap_or("-"),
            from = ?self.state,
            to = ?next,
            "Request state change"
        );
        self.state = next;
    }

    /// Move to the terminal state matching `error`
    fn fail(&mut self, error: &PipelineError) {
        if error.is_rejection() {
            self.advance(RequestState::Rejected);
        } else {
            self.advance(RequestState::Failed);
        }
    }
}

/// Feature encoder and inference service wired together
pub struct RiskPipeline {
    encoder: FeatureEncoder,
    service: InferenceService,
    metrics: Arc<PipelineMetrics>,
}

impl RiskPipeline {
    pub fn new(encoder: FeatureEncoder, service: InferenceService) -> Self {
        Self {
            encoder,
            service,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build the pipeline for the configured artifact and its feature schema
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            FeatureEncoder::new(config.age_unit),
            InferenceService::from_config(config),
        )
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn service(&self) -> &InferenceService {
        &self.service
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Run one request and return its report or the error that ended it.
    pub fn assess(
        &self,
        input: &RawInput,
        record_id: Option<&str>,
    ) -> Result<RiskReport, PipelineError> {
        self.assess_traced(input, record_id).1
    }

    /// Run one record and produce its terminal outcome
    pub fn process(&self, record: PatientRecord) -> Outcome {
        let start_time = Instant::now();
        let (state, result) = self.assess_traced(&record.input, record.id.as_deref());
        let elapsed = start_time.elapsed();

        self.metrics.record_request(elapsed, state, result.as_ref().ok().map(|r| r.verdict));

        Outcome::from_result(record.id, result)
    }

    fn assess_traced(
        &self,
        input: &RawInput,
        record_id: Option<&str>,
    ) -> (RequestState, Result<RiskReport, PipelineError>) {
        let mut request = RequestTrace::new(record_id);
        let result = self.run(input, &mut request);

        if let Err(e) = &result {
            request.fail(e);
        }

        (request.state, result)
    }

    fn run(
        &self,
        input: &RawInput,
        request: &mut RequestTrace<'_>,
    ) -> Result<RiskReport, PipelineError> {
        let start_time = Instant::now();

        if let Err(e) = input.validate() {
            warn!(
                record_id = request.record_id.unwrap_or("-"),
                error = %e,
                "Request rejected"
            );
            return Err(e.into());
        }
        request.advance(RequestState::Validated);

        let features = self.encoder.encode(input);
        request.advance(RequestState::Encoded);

        let verdict = self.service.predict(&features)?;
        request.advance(RequestState::Predicted);

        let latency_us = start_time.elapsed().as_micros() as u64;
        let report = RiskReport::new(record_id_owned(request.record_id), verdict, features.to_vec())
            .with_latency_us(latency_us);
        request.advance(RequestState::Reported);

        debug!(
            record_id = request.record_id.unwrap_or("-"),
            verdict = %verdict,
            processing_time_us = latency_us,
            "Request reported"
        );

        Ok(report)
    }
}

fn record_id_owned(record_id: Option<&str>) -> Option<String> {
    record_id.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, InferenceError, ModelLoadError, ValidationError};
    use crate::feature_encoder::AgeUnit;
    use crate::models::inference::tests::StubClassifier;
    use crate::types::patient::{Gender, LabLevel};
    use crate::types::report::Verdict;
    use std::path::PathBuf;

    fn sample() -> RawInput {
        RawInput {
            age: 45,
            gender: Gender::Male,
            height_cm: 170,
            weight_kg: 80,
            systolic_bp: 130,
            diastolic_bp: 85,
            cholesterol: LabLevel::Normal,
            glucose: LabLevel::Normal,
            smoker: false,
            drinks_alcohol: false,
            physically_active: true,
        }
    }

    fn pipeline_with(stub: Arc<StubClassifier>) -> RiskPipeline {
        RiskPipeline::new(
            FeatureEncoder::new(AgeUnit::Days),
            InferenceService::with_classifier(stub),
        )
    }

    #[test]
    fn test_low_risk_report() {
        let stub = StubClassifier::returning(0);
        let pipeline = pipeline_with(stub.clone());

        let (state, result) = pipeline.assess_traced(&sample(), Some("p-1"));
        let report = result.unwrap();

        assert_eq!(state, RequestState::Reported);
        assert_eq!(report.verdict, Verdict::LowRisk);
        assert_eq!(report.record_id.as_deref(), Some("p-1"));
        assert_eq!(
            report.features,
            vec![16425.0, 170.0, 80.0, 1.0, 130.0, 85.0, 1.0, 1.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn test_zero_field_rejected_without_inference() {
        let stub = StubClassifier::returning(1);
        let pipeline = pipeline_with(stub.clone());

        let mut input = sample();
        input.systolic_bp = 0;

        let (state, result) = pipeline.assess_traced(&input, None);

        assert_eq!(state, RequestState::Rejected);
        assert_eq!(
            result.unwrap_err(),
            PipelineError::Validation(ValidationError::ZeroOrMissingField {
                field: "systolic_bp"
            })
        );
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_every_required_zero_field_short_circuits() {
        let stub = StubClassifier::returning(0);
        let pipeline = pipeline_with(stub.clone());

        let zero_outs: [fn(&mut RawInput); 5] = [
            |i| i.age = 0,
            |i| i.height_cm = 0,
            |i| i.weight_kg = 0,
            |i| i.systolic_bp = 0,
            |i| i.diastolic_bp = 0,
        ];

        for zero_out in zero_outs {
            let mut input = sample();
            zero_out(&mut input);
            let outcome = pipeline.process(PatientRecord { id: None, input });
            assert!(matches!(outcome, Outcome::Rejected(_)));
        }

        assert_eq!(stub.calls(), 0);
        assert_eq!(pipeline.metrics().snapshot().rejected, 5);
    }

    #[test]
    fn test_inference_failure_fails_request() {
        let pipeline = pipeline_with(StubClassifier::failing("shape mismatch"));

        let (state, result) = pipeline.assess_traced(&sample(), None);

        assert_eq!(state, RequestState::Failed);
        assert_eq!(
            result.unwrap_err(),
            PipelineError::Inference(InferenceError::RuntimeFailure)
        );
    }

    #[test]
    fn test_missing_artifact_fails_every_request() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            artifact_path: dir.path().join("heart_disease_model.onnx"),
            ..ModelConfig::default()
        };
        let pipeline = RiskPipeline::from_config(&config);
        assert_eq!(pipeline.service().artifact_path(), config.artifact_path.as_path());
        assert_eq!(pipeline.encoder().age_unit(), AgeUnit::Days);

        for id in ["a", "b"] {
            let outcome = pipeline.process(PatientRecord {
                id: Some(id.to_string()),
                input: sample(),
            });
            match outcome {
                Outcome::Failed(report) => {
                    assert_eq!(report.kind, ErrorKind::ModelNotFound);
                    assert_eq!(report.record_id.as_deref(), Some(id));
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }

        assert!(!pipeline.service().is_loaded());
        assert_eq!(pipeline.metrics().snapshot().failed, 2);
    }

    #[test]
    fn test_directory_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            artifact_path: dir.path().to_path_buf(),
            ..ModelConfig::default()
        };
        let pipeline = RiskPipeline::from_config(&config);

        assert_eq!(
            pipeline.assess(&sample(), None).unwrap_err(),
            PipelineError::ModelLoad(ModelLoadError::NotFound {
                path: PathBuf::from(dir.path())
            })
        );
    }

    #[test]
    fn test_process_records_metrics() {
        let pipeline = pipeline_with(StubClassifier::returning(1));

        let outcome = pipeline.process(PatientRecord {
            id: Some("p-2".to_string()),
            input: sample(),
        });

        assert_eq!(outcome.status(), "reported");
        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.reported, 1);
        assert_eq!(snapshot.high_risk, 1);
    }

    #[test]
    fn test_terminal_states() {
        assert!(RequestState::Reported.is_terminal());
        assert!(RequestState::Rejected.is_terminal());
        assert!(RequestState::Failed.is_terminal());
        assert!(!RequestState::Encoded.is_terminal());
    }
}
