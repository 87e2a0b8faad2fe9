//! Batch prediction - Main Entry Point
//!
//! Loads the saved scaler and classifiers, predicts over an input CSV and
//! writes labels and probabilities to an output CSV.

use anyhow::{Context, Result};
use clap::Parser;
use model_predict::{
    cli::{self, Args},
    config::{AppConfig, LogFormat, LoggingConfig},
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    init_logging(&config.logging)?;

    let report = cli::run(&args.input, args.id_col.as_deref(), &config)
        .with_context(|| format!("Prediction failed for {}", args.input.display()))?;

    println!("Predictions saved to {}", report.output_path.display());

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("model_predict={}", logging.level).parse()?),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}
