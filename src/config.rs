//! Configuration management for the risk pipeline

use crate::feature_encoder::AgeUnit;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Classifier artifact configuration.
///
/// `age_unit` belongs to the trained artifact: change it only together with
/// `artifact_path`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX classifier file
    pub artifact_path: PathBuf,
    /// Unit of the age feature the artifact was trained with
    #[serde(default)]
    pub age_unit: AgeUnit,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("models/heart_disease_model.onnx"),
            age_unit: AgeUnit::Days,
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Request source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Newline-delimited JSON patient records; "-" reads stdin
    #[serde(default = "default_input")]
    pub input: String,
}

fn default_input() -> String {
    "-".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file plus `CARDIO_*` overrides
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// Environment variables such as `CARDIO_MODEL__ARTIFACT_PATH` override
    /// values from the file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CARDIO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
