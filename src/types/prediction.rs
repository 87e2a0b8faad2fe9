//! Prediction output structures

use crate::types::table::{format_float, Column};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class label as stored in a fitted classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(v) => write!(f, "{}", v),
            Label::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label::Int(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

/// Output of one classifier over every row of a table
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    /// Column prefix, e.g. `LR`
    pub prefix: String,
    /// Predicted label per row
    pub labels: Vec<Label>,
    /// Positive-class probability per row, `None` when the classifier
    /// cannot estimate probabilities
    pub probabilities: Option<Vec<f64>>,
}

impl ModelOutput {
    pub fn label_column(&self) -> String {
        format!("{}_PRED", self.prefix)
    }

    pub fn probability_column(&self) -> String {
        format!("{}_PROB", self.prefix)
    }

    pub fn probability(&self, row: usize) -> Option<f64> {
        self.probabilities.as_ref().map(|p| p[row])
    }
}

/// Result table: optional identifier column followed by label and
/// probability columns for each classifier, in input row order.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    pub id: Option<Column>,
    pub outputs: Vec<ModelOutput>,
    n_rows: usize,
}

impl PredictionTable {
    pub fn new(id: Option<Column>, outputs: Vec<ModelOutput>, n_rows: usize) -> Self {
        Self {
            id,
            outputs,
            n_rows,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Header row in output order.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(1 + 2 * self.outputs.len());
        if let Some(id) = &self.id {
            headers.push(id.name.clone());
        }
        for output in &self.outputs {
            headers.push(output.label_column());
            headers.push(output.probability_column());
        }
        headers
    }

    /// One output row rendered as CSV cells. Missing probabilities are empty.
    pub fn row(&self, row: usize) -> Vec<String> {
        let mut cells = Vec::with_capacity(1 + 2 * self.outputs.len());
        if let Some(id) = &self.id {
            cells.push(id.data.format_cell(row));
        }
        for output in &self.outputs {
            cells.push(output.labels[row].to_string());
            cells.push(output.probability(row).map(format_float).unwrap_or_default());
        }
        cells
    }

    pub fn output(&self, prefix: &str) -> Option<&ModelOutput> {
        self.outputs.iter().find(|o| o.prefix == prefix)
    }
}
