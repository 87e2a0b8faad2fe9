//! Command-line surface and the one-shot prediction run

use crate::config::{AppConfig, LogFormat};
use crate::error::{PredictError, Result};
use crate::metrics::{RunMetrics, Stage};
use crate::models::inference::InferenceEngine;
use crate::models::loader::ModelLoader;
use crate::table_io::{read_table, write_predictions};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Predict using saved models.
#[derive(Debug, Clone, Parser)]
#[command(name = "predict", version, about = "Predict using saved models.")]
pub struct Args {
    /// Path to input CSV file with cleaned features.
    #[arg(long)]
    pub input: PathBuf,

    /// Path to output CSV file [default: predictions.csv]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Path to models directory [default: <program dir>/models]
    #[arg(long = "model_dir", alias = "model-dir")]
    pub model_dir: Option<PathBuf>,

    /// Optional ID column in input to preserve in output.
    #[arg(long = "id_col", alias = "id-col")]
    pub id_col: Option<String>,

    /// Optional TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long = "log-format", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Args {
    /// Apply explicit flags on top of the layered configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(model_dir) = &self.model_dir {
            config.models.model_dir = model_dir.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub rows: usize,
    pub id_col: Option<String>,
}

/// Load models, predict over `input` and write the result table.
///
/// Nothing is written unless every earlier stage succeeds.
pub fn run(input: &Path, id_col: Option<&str>, config: &AppConfig) -> Result<RunReport> {
    if !input.exists() {
        return Err(PredictError::MissingInputFile(input.to_path_buf()));
    }

    let metrics = RunMetrics::new();

    let models = metrics.time_stage(Stage::LoadModels, || {
        ModelLoader::from_config(&config.models).load_all()
    })?;
    let engine = InferenceEngine::new(models, &config.models);

    let table = metrics.time_stage(Stage::ReadInput, || read_table(input))?;
    let (rows, columns) = table.shape();
    metrics.record_rows(rows);
    info!(rows = rows, columns = columns, "Input shape: ({}, {})", rows, columns);

    let id_col = match id_col {
        Some(name) if table.has_column(name) => Some(name),
        Some(name) => {
            warn!(column = %name, "ID column not found in input, predictions will not carry it");
            None
        }
        None => None,
    };

    let predictions =
        metrics.time_stage(Stage::Predict, || engine.predict(&table, id_col, &metrics))?;

    let output_path = config.output.path.clone();
    metrics.time_stage(Stage::WriteOutput, || {
        write_predictions(&output_path, &predictions)
    })?;
    info!(path = %output_path.display(), rows = rows, "Wrote predictions");

    metrics.print_summary();

    Ok(RunReport {
        output_path,
        rows,
        id_col: id_col.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "predict",
            "--input",
            "data/new_customers.csv",
            "--model_dir",
            "/srv/models",
            "--id_col",
            "cust_id",
        ])
        .unwrap();

        assert_eq!(args.input, PathBuf::from("data/new_customers.csv"));
        assert_eq!(args.model_dir, Some(PathBuf::from("/srv/models")));
        assert_eq!(args.id_col.as_deref(), Some("cust_id"));
        assert!(args.output.is_none());
    }

    #[test]
    fn test_input_is_required() {
        assert!(Args::try_parse_from(["predict", "--output", "out.csv"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "predict",
            "--input",
            "in.csv",
            "--output",
            "out.csv",
            "--log-format",
            "json",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.output.path, PathBuf::from("out.csv"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.models, AppConfig::default().models);
    }

    #[test]
    fn test_missing_input_checked_before_models() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.models.model_dir = dir.path().join("no_models_here");

        let result = run(&dir.path().join("absent.csv"), None, &config);
        assert!(matches!(result, Err(PredictError::MissingInputFile(_))));
    }
}
