//! Run statistics for a prediction run.

use crate::types::prediction::Label;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::info;

/// Pipeline stages timed by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    LoadModels,
    ReadInput,
    Predict,
    WriteOutput,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::LoadModels => "load_models",
            Stage::ReadInput => "read_input",
            Stage::Predict => "predict",
            Stage::WriteOutput => "write_output",
        }
    }
}

/// Per-model statistics
#[derive(Debug, Clone, Default)]
pub struct ModelStats {
    pub inference_us: u64,
    pub rows: u64,
    /// Predicted label counts, ordered by label
    pub label_counts: BTreeMap<Label, u64>,
}

/// Metrics collector for one single-threaded run
pub struct RunMetrics {
    /// Rows read from the input table
    rows_processed: Cell<u64>,
    stage_times: RefCell<BTreeMap<Stage, Duration>>,
    model_stats: RefCell<HashMap<String, ModelStats>>,
    /// Rows on which both classifiers predicted the same label
    rows_agreeing: Cell<u64>,
    rows_compared: Cell<u64>,
    start_time: Instant,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            rows_processed: Cell::new(0),
            stage_times: RefCell::new(BTreeMap::new()),
            model_stats: RefCell::new(HashMap::new()),
            rows_agreeing: Cell::new(0),
            rows_compared: Cell::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_rows(&self, rows: usize) {
        self.rows_processed.set(rows as u64);
    }

    pub fn rows_processed(&self) -> u64 {
        self.rows_processed.get()
    }

    pub fn record_stage(&self, stage: Stage, duration: Duration) {
        *self.stage_times.borrow_mut().entry(stage).or_default() += duration;
    }

    /// Time `f` and record it under `stage`.
    pub fn time_stage<T>(&self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        self.record_stage(stage, start.elapsed());
        value
    }

    /// Record one classifier's inference time and label distribution
    pub fn record_model(&self, model_name: &str, duration: Duration, labels: &[Label]) {
        let mut stats = self.model_stats.borrow_mut();
        let entry = stats.entry(model_name.to_string()).or_default();
        entry.inference_us += duration.as_micros() as u64;
        entry.rows += labels.len() as u64;
        for label in labels {
            *entry.label_counts.entry(label.clone()).or_insert(0) += 1;
        }
    }

    /// Record how many rows two classifiers agree on
    pub fn record_agreement(&self, a: &[Label], b: &[Label]) {
        let agreeing = a.iter().zip(b).filter(|(x, y)| x == y).count();
        self.rows_agreeing.set(self.rows_agreeing.get() + agreeing as u64);
        self.rows_compared
            .set(self.rows_compared.get() + a.len().min(b.len()) as u64);
    }

    pub fn rows_agreeing(&self) -> u64 {
        self.rows_agreeing.get()
    }

    /// Fraction of compared rows where both classifiers agree
    pub fn get_agreement(&self) -> f64 {
        let compared = self.rows_compared.get();
        if compared == 0 {
            return 0.0;
        }
        self.rows_agreeing() as f64 / compared as f64
    }

    pub fn get_stage_time(&self, stage: Stage) -> Option<Duration> {
        self.stage_times.borrow().get(&stage).copied()
    }

    pub fn get_model_stats(&self) -> HashMap<String, ModelStats> {
        self.model_stats.borrow().clone()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        info!(
            rows = self.rows_processed(),
            elapsed_ms = self.start_time.elapsed().as_millis() as u64,
            agreement = format!("{:.1}%", self.get_agreement() * 100.0),
            "Run summary"
        );

        for (stage, duration) in self.stage_times.borrow().iter() {
            info!(stage = stage.as_str(), duration_us = duration.as_micros() as u64, "Stage time");
        }

        let mut models: Vec<(String, ModelStats)> = self.get_model_stats().into_iter().collect();
        models.sort_by(|a, b| a.0.cmp(&b.0));
        for (model, stats) in &models {
            let labels: Vec<String> = stats
                .label_counts
                .iter()
                .map(|(label, count)| format!("{}={}", label, count))
                .collect();
            info!(
                model = %model,
                inference_us = stats.inference_us,
                rows = stats.rows,
                labels = %labels.join(", "),
                "Model summary"
            );
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
