//! Inference service: owns the classifier artifact and turns feature
//! vectors into verdicts

use crate::config::ModelConfig;
use crate::error::{InferenceError, ModelLoadError, PipelineError};
use crate::feature_encoder::FeatureVector;
use crate::models::classifier::Classifier;
use crate::models::loader::{ArtifactLoader, OnnxLoader};
use crate::types::report::Verdict;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

type LoadOutcome = Result<Arc<dyn Classifier>, ModelLoadError>;

/// Owns the classifier for the lifetime of the process.
///
/// The artifact is loaded lazily on first use and the outcome, success or
/// failure, is cached until [`InferenceService::reset`] is called. The slot
/// mutex doubles as the single-initialization guard.
pub struct InferenceService {
    artifact_path: PathBuf,
    loader: Box<dyn ArtifactLoader>,
    artifact: Mutex<Option<LoadOutcome>>,
}

impl InferenceService {
    /// Create a service that loads `artifact_path` through `loader`.
    pub fn new(artifact_path: impl Into<PathBuf>, loader: Box<dyn ArtifactLoader>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            loader,
            artifact: Mutex::new(None),
        }
    }

    /// Create a service backed by the ONNX artifact named in the configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            &config.artifact_path,
            Box::new(OnnxLoader::with_threads(config.onnx_threads)),
        )
    }

    /// Create a service around an already constructed classifier
    pub fn with_classifier(classifier: Arc<dyn Classifier>) -> Self {
        Self::new("<in-memory>", Box::new(Preloaded(classifier)))
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Return the cached classifier, loading it on first call.
    pub fn load_artifact(&self) -> Result<Arc<dyn Classifier>, ModelLoadError> {
        let mut slot = self.slot();
        if let Some(cached) = slot.as_ref() {
            return cached.clone();
        }

        let outcome = self.loader.load(&self.artifact_path);
        match &outcome {
            Ok(classifier) => info!(
                model = %classifier.name(),
                path = %self.artifact_path.display(),
                "Classifier artifact ready"
            ),
            Err(e) => error!(
                path = %self.artifact_path.display(),
                error = %e,
                "Failed to load classifier artifact"
            ),
        }

        *slot = Some(outcome.clone());
        outcome
    }

    /// Whether a classifier is currently loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self.slot().as_ref(), Some(Ok(_)))
    }

    /// Drop the cached load outcome so the next request loads again.
    pub fn reset(&self) {
        *self.slot() = None;
        info!(path = %self.artifact_path.display(), "Classifier artifact reset");
    }

    /// Classify one encoded vector.
    ///
    /// Fails without calling the classifier if the artifact is unavailable.
    /// Runtime errors are logged here and surfaced as a generic failure.
    pub fn predict(&self, features: &FeatureVector) -> Result<Verdict, PipelineError> {
        let classifier = self.load_artifact()?;

        let class = classifier.predict(features).map_err(|e| {
            error!(model = %classifier.name(), error = %e, "Inference failed");
            InferenceError::RuntimeFailure
        })?;

        let verdict = Verdict::from_class(class).map_err(|e| {
            error!(model = %classifier.name(), class = class, "Classifier returned unexpected class");
            e
        })?;

        debug!(model = %classifier.name(), class = class, verdict = %verdict, "Inference complete");

        Ok(verdict)
    }

    fn slot(&self) -> MutexGuard<'_, Option<LoadOutcome>> {
        self.artifact.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Loader that hands out a classifier constructed elsewhere
struct Preloaded(Arc<dyn Classifier>);

impl ArtifactLoader for Preloaded {
    fn load(&self, _path: &Path) -> LoadOutcome {
        Ok(self.0.clone())
    }
}
