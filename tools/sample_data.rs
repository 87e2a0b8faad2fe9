//! Sample Data Generator
//!
//! Writes a demo model directory (scaler, logistic regression, random forest)
//! and a random input CSV for trying out the `predict` binary.

use anyhow::{Context, Result};
use clap::Parser;
use model_predict::models::classifier::DecisionTree;
use model_predict::{ClassifierModel, Label, Scaler};
use rand::Rng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const FEATURES: [&str; 4] = ["tenure_months", "monthly_charges", "support_calls", "age"];

#[derive(Debug, Parser)]
#[command(name = "sample-data", about = "Generate demo model artifacts and input rows")]
struct Args {
    /// Directory to write the model artifacts into
    #[arg(long = "model_dir", default_value = "models")]
    model_dir: PathBuf,

    /// Input CSV to generate
    #[arg(long, default_value = "new_customers.csv")]
    output: PathBuf,

    /// Number of rows
    #[arg(long, default_value_t = 100)]
    rows: usize,

    /// Skip writing scaler.json
    #[arg(long)]
    no_scaler: bool,
}

/// Random customer generator for testing
struct CustomerGenerator {
    rng: rand::rngs::ThreadRng,
    customer_counter: u64,
}

impl CustomerGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            customer_counter: 0,
        }
    }

    /// Generate one CSV record: id followed by the features
    fn generate(&mut self) -> Vec<String> {
        self.customer_counter += 1;
        let churn_prone = self.rng.gen_bool(0.25);

        let (tenure, charges, calls) = if churn_prone {
            (
                self.rng.gen_range(1..12),
                self.rng.gen_range(70.0..120.0),
                self.rng.gen_range(3..10),
            )
        } else {
            (
                self.rng.gen_range(12..72),
                self.rng.gen_range(20.0..90.0),
                self.rng.gen_range(0..3),
            )
        };

        vec![
            format!("{}", 1000 + self.customer_counter),
            tenure.to_string(),
            format!("{:.2}", charges),
            calls.to_string(),
            self.rng.gen_range(18..80).to_string(),
        ]
    }
}

fn feature_names() -> Option<Vec<String>> {
    Some(FEATURES.iter().map(|s| s.to_string()).collect())
}

fn demo_scaler() -> Scaler {
    Scaler::Standard {
        mean: Some(vec![36.0, 65.0, 2.0, 45.0]),
        scale: Some(vec![20.0, 25.0, 2.0, 15.0]),
        feature_names_in: feature_names(),
    }
}

fn demo_logistic_regression() -> ClassifierModel {
    ClassifierModel::LogisticRegression {
        classes: vec![Label::Int(0), Label::Int(1)],
        coef: vec![vec![-1.2, 0.8, 1.1, -0.1]],
        intercept: vec![-1.0],
        feature_names_in: feature_names(),
    }
}

/// Depth-one trees on the scaled features; leaf values are class counts.
fn demo_random_forest() -> ClassifierModel {
    let stump = |feature: i64, threshold: f64, left: [f64; 2], right: [f64; 2]| DecisionTree {
        children_left: vec![1, -1, -1],
        children_right: vec![2, -1, -1],
        feature: vec![feature, -2, -2],
        threshold: vec![threshold, -2.0, -2.0],
        value: vec![
            vec![left[0] + right[0], left[1] + right[1]],
            left.to_vec(),
            right.to_vec(),
        ],
    };

    ClassifierModel::RandomForest {
        classes: vec![Label::Int(0), Label::Int(1)],
        trees: vec![
            stump(0, -0.8, [10.0, 30.0], [80.0, 10.0]),
            stump(1, 0.6, [70.0, 15.0], [15.0, 35.0]),
            stump(2, 0.4, [75.0, 10.0], [10.0, 40.0]),
        ],
        n_features_in: Some(FEATURES.len()),
        feature_names_in: feature_names(),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote artifact");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_data=info".parse()?),
        )
        .init();

    let args = Args::parse();
    info!(
        model_dir = %args.model_dir.display(),
        output = %args.output.display(),
        rows = args.rows,
        scaler = !args.no_scaler,
        "Generating sample data"
    );

    fs::create_dir_all(&args.model_dir)
        .with_context(|| format!("Failed to create {}", args.model_dir.display()))?;
    if !args.no_scaler {
        write_json(&args.model_dir.join("scaler.json"), &demo_scaler())?;
    }
    write_json(
        &args.model_dir.join("logistic_regression_model.json"),
        &demo_logistic_regression(),
    )?;
    write_json(
        &args.model_dir.join("random_forest_model.json"),
        &demo_random_forest(),
    )?;

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut header = vec!["cust_id"];
    header.extend(FEATURES);
    writer.write_record(&header)?;

    let mut generator = CustomerGenerator::new();
    for _ in 0..args.rows {
        writer.write_record(generator.generate())?;
    }
    writer.flush()?;

    info!(
        "Completed! Wrote {} rows to {}",
        args.rows,
        args.output.display()
    );
    Ok(())
}
