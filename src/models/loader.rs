//! Classifier artifact loader

use crate::error::ModelLoadError;
use crate::models::classifier::{Classifier, OnnxClassifier};
use anyhow::Context;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Source of classifier artifacts.
pub trait ArtifactLoader: Send + Sync {
    /// Load the artifact stored at `path`.
    fn load(&self, path: &Path) -> Result<Arc<dyn Classifier>, ModelLoadError>;
}

/// Fails with `NotFound` unless `path` is an existing regular file.
pub fn ensure_regular_file(path: &Path) -> Result<(), ModelLoadError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ModelLoadError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Loader for ONNX classifier artifacts
pub struct OnnxLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl OnnxLoader {
    /// Create a new loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    fn build_session(&self, path: &Path) -> anyhow::Result<Session> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;
        Ok(session)
    }
}

impl Default for OnnxLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactLoader for OnnxLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn Classifier>, ModelLoadError> {
        ensure_regular_file(path)?;

        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = self
            .build_session(path)
            .map_err(|e| ModelLoadError::Corrupt {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        let classifier = OnnxClassifier::new(&name, session);

        info!(
            model = %name,
            input = %classifier.input_name(),
            label_output = ?classifier.label_output(),
            "Model loaded successfully"
        );

        Ok(Arc::new(classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heart_disease_model.onnx");

        let err = OnnxLoader::new().load(&path).err().unwrap();
        assert_eq!(err, ModelLoadError::NotFound { path });
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let err = OnnxLoader::new().load(dir.path()).err().unwrap();
        assert!(matches!(err, ModelLoadError::NotFound { .. }));
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an onnx protobuf").unwrap();

        let err = OnnxLoader::new().load(file.path()).err().unwrap();
        assert!(matches!(err, ModelLoadError::Corrupt { .. }));
    }

    #[test]
    fn test_thread_count_floor() {
        assert_eq!(OnnxLoader::with_threads(0).onnx_threads, 1);
    }
}
