//! Configuration management for the prediction tool

use anyhow::{Context, Result};
use crate::models::inference::{DEFAULT_PRIMARY_PREFIX, DEFAULT_SECONDARY_PREFIX};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelsConfig {
    /// Directory containing the artifact files
    pub model_dir: PathBuf,
    /// Optional scaler artifact
    pub scaler_file: String,
    /// First classifier (logistic regression)
    pub primary_file: String,
    /// Second classifier (random forest)
    pub secondary_file: String,
    /// Output column prefix for the first classifier
    pub primary_prefix: String,
    /// Output column prefix for the second classifier
    pub secondary_prefix: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            scaler_file: "scaler.json".to_string(),
            primary_file: "logistic_regression_model.json".to_string(),
            secondary_file: "random_forest_model.json".to_string(),
            primary_prefix: DEFAULT_PRIMARY_PREFIX.to_string(),
            secondary_prefix: DEFAULT_SECONDARY_PREFIX.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Result table path
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("predictions.csv"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// `models` directory next to the running executable, or `./models` when the
/// executable path cannot be resolved.
pub fn default_model_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")))
        .unwrap_or_else(|| PathBuf::from("models"))
}

impl AppConfig {
    /// Load configuration: defaults, then an optional TOML file, then
    /// `PREDICT_`-prefixed environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// `env` replaces the process environment when given.
    fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let defaults =
            Config::try_from(&AppConfig::default()).context("Failed to serialize defaults")?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("PREDICT")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
