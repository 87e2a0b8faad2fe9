//! Fitted classifiers and the interface the prediction assembler uses

use crate::error::{PredictError, Result};
use crate::models::scaler::check_features;
use crate::types::prediction::Label;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// A previously-fitted classifier.
///
/// Label prediction is always available. Probability estimation is optional;
/// `predict_proba` returns `None` for classifiers that cannot estimate it.
/// `names` are the column names of `x`, used to check them against the names
/// the classifier was fitted on.
pub trait Classifier {
    /// Short description used in logs.
    fn describe(&self) -> String;

    /// One label per row of `x`.
    fn predict(&self, x: &Array2<f64>, names: &[&str]) -> Result<Vec<Label>>;

    /// `rows x classes` class-membership probabilities.
    fn predict_proba(&self, x: &Array2<f64>, names: &[&str]) -> Option<Result<Array2<f64>>>;
}

/// Single decision tree stored as flat node arrays.
///
/// A node is a leaf when its left child is `-1`. Rows go left when
/// `x[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class counts or fractions
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_classes: usize, n_features: usize) -> Result<()> {
        let n_nodes = self.children_left.len();
        if n_nodes == 0 {
            return Err(PredictError::InvalidModel("tree has no nodes".to_string()));
        }
        if self.children_right.len() != n_nodes
            || self.feature.len() != n_nodes
            || self.threshold.len() != n_nodes
            || self.value.len() != n_nodes
        {
            return Err(PredictError::InvalidModel(format!(
                "tree node arrays disagree in length (expected {})",
                n_nodes
            )));
        }

        let in_range = |child: i64| child >= 0 && (child as usize) < n_nodes;
        for node in 0..n_nodes {
            if self.children_left[node] == -1 {
                if self.value[node].len() != n_classes {
                    return Err(PredictError::InvalidModel(format!(
                        "leaf {} has {} class values, expected {}",
                        node,
                        self.value[node].len(),
                        n_classes
                    )));
                }
                continue;
            }
            // Children must point forward or traversal could loop.
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if !in_range(left) || !in_range(right) || left as usize <= node || right as usize <= node {
                return Err(PredictError::InvalidModel(format!(
                    "node {} has invalid children ({}, {})",
                    node, left, right
                )));
            }
            let feature = self.feature[node];
            if feature < 0 || (n_features > 0 && feature as usize >= n_features) {
                return Err(PredictError::InvalidModel(format!(
                    "node {} splits on invalid feature {}",
                    node, feature
                )));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf `row` lands in.
    ///
    /// Assumes the tree passed `validate` and `row` is wide enough for every split.
    fn leaf_distribution(&self, row: ArrayView1<f64>) -> Vec<f64> {
        let mut node = 0usize;
        while self.children_left[node] != -1 {
            let value = row[self.feature[node] as usize];
            node = if value <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let leaf = &self.value[node];
        let total: f64 = leaf.iter().sum();
        if total > 0.0 {
            leaf.iter().map(|v| v / total).collect()
        } else {
            leaf.clone()
        }
    }
}

/// Fitted classifier artifact, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    LogisticRegression {
        classes: Vec<Label>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        #[serde(default)]
        feature_names_in: Option<Vec<String>>,
    },
    RandomForest {
        classes: Vec<Label>,
        trees: Vec<DecisionTree>,
        #[serde(default)]
        n_features_in: Option<usize>,
        #[serde(default)]
        feature_names_in: Option<Vec<String>>,
    },
    /// Linear SVM: decision function only, no probabilities
    LinearSvc {
        classes: Vec<Label>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        #[serde(default)]
        feature_names_in: Option<Vec<String>>,
    },
}

impl ClassifierModel {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierModel::LogisticRegression { .. } => "logistic_regression",
            ClassifierModel::RandomForest { .. } => "random_forest",
            ClassifierModel::LinearSvc { .. } => "linear_svc",
        }
    }

    pub fn classes(&self) -> &[Label] {
        match self {
            ClassifierModel::LogisticRegression { classes, .. }
            | ClassifierModel::RandomForest { classes, .. }
            | ClassifierModel::LinearSvc { classes, .. } => classes,
        }
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        match self {
            ClassifierModel::LogisticRegression {
                feature_names_in, ..
            }
            | ClassifierModel::RandomForest {
                feature_names_in, ..
            }
            | ClassifierModel::LinearSvc {
                feature_names_in, ..
            } => feature_names_in.as_deref(),
        }
    }

    pub fn n_features(&self) -> Option<usize> {
        match self {
            ClassifierModel::LogisticRegression { coef, .. }
            | ClassifierModel::LinearSvc { coef, .. } => coef.first().map(Vec::len),
            ClassifierModel::RandomForest {
                n_features_in,
                feature_names_in,
                ..
            } => n_features_in.or_else(|| feature_names_in.as_ref().map(Vec::len)),
        }
    }

    /// Check internal consistency of the fitted parameters.
    pub fn validate(&self) -> Result<()> {
        let n_classes = self.classes().len();
        if n_classes < 2 {
            return Err(PredictError::InvalidModel(format!(
                "{} needs at least two classes, got {}",
                self.kind(),
                n_classes
            )));
        }

        match self {
            ClassifierModel::LogisticRegression {
                coef, intercept, ..
            }
            | ClassifierModel::LinearSvc {
                coef, intercept, ..
            } => {
                let expected_rows = if n_classes == 2 { 1 } else { n_classes };
                if coef.len() != expected_rows || intercept.len() != expected_rows {
                    return Err(PredictError::InvalidModel(format!(
                        "{} with {} classes needs {} coefficient rows and intercepts, got {} and {}",
                        self.kind(),
                        n_classes,
                        expected_rows,
                        coef.len(),
                        intercept.len()
                    )));
                }
                let width = coef[0].len();
                if coef.iter().any(|row| row.len() != width) {
                    return Err(PredictError::InvalidModel(format!(
                        "{} coefficient rows differ in length",
                        self.kind()
                    )));
                }
            }
            ClassifierModel::RandomForest { trees, .. } => {
                if trees.is_empty() {
                    return Err(PredictError::InvalidModel(
                        "random_forest has no trees".to_string(),
                    ));
                }
                let n_features = self.n_features().unwrap_or(0);
                for tree in trees {
                    tree.validate(n_classes, n_features)?;
                }
            }
        }

        if let (Some(names), Some(n)) = (self.feature_names_in(), self.n_features()) {
            if names.len() != n {
                return Err(PredictError::InvalidModel(format!(
                    "{} records {} feature names for {} features",
                    self.kind(),
                    names.len(),
                    n
                )));
            }
        }
        Ok(())
    }

    fn check_input(&self, x: &Array2<f64>, names: &[&str]) -> Result<()> {
        // Models built in code never went through the loader.
        self.validate()?;
        check_features(self.n_features(), self.feature_names_in(), x, names, self.kind())?;
        if let ClassifierModel::RandomForest { trees, .. } = self {
            // Trees without a recorded width still must not index past the row.
            let max_feature = trees
                .iter()
                .flat_map(|t| t.feature.iter().copied())
                .max()
                .unwrap_or(-1);
            if max_feature >= x.ncols() as i64 {
                return Err(PredictError::FeatureMismatch(format!(
                    "random_forest splits on feature {}, input has {} columns",
                    max_feature,
                    x.ncols()
                )));
            }
        }
        Ok(())
    }

    /// Raw decision values: one column for binary linear models, one per class otherwise.
    fn decision_function(coef: &[Vec<f64>], intercept: &[f64], x: &Array2<f64>) -> Array2<f64> {
        let mut scores = Array2::<f64>::zeros((x.nrows(), coef.len()));
        for (i, row) in x.axis_iter(Axis(0)).enumerate() {
            for (k, (weights, bias)) in coef.iter().zip(intercept).enumerate() {
                let dot: f64 = row.iter().zip(weights).map(|(v, w)| v * w).sum();
                scores[[i, k]] = dot + bias;
            }
        }
        scores
    }

    fn probabilities(&self, x: &Array2<f64>) -> Option<Array2<f64>> {
        match self {
            ClassifierModel::LogisticRegression {
                coef, intercept, ..
            } => {
                let scores = Self::decision_function(coef, intercept, x);
                if scores.ncols() == 1 {
                    let mut proba = Array2::<f64>::zeros((x.nrows(), 2));
                    for (i, &z) in scores.column(0).iter().enumerate() {
                        let p = sigmoid(z);
                        proba[[i, 0]] = 1.0 - p;
                        proba[[i, 1]] = p;
                    }
                    Some(proba)
                } else {
                    let mut proba = scores;
                    for mut row in proba.axis_iter_mut(Axis(0)) {
                        softmax_inplace(row.as_slice_mut()?);
                    }
                    Some(proba)
                }
            }
            ClassifierModel::RandomForest { classes, trees, .. } => {
                let mut proba = Array2::<f64>::zeros((x.nrows(), classes.len()));
                for (i, row) in x.axis_iter(Axis(0)).enumerate() {
                    for tree in trees {
                        for (k, p) in tree.leaf_distribution(row).into_iter().enumerate() {
                            proba[[i, k]] += p;
                        }
                    }
                }
                proba.mapv_inplace(|p| p / trees.len() as f64);
                Some(proba)
            }
            ClassifierModel::LinearSvc { .. } => None,
        }
    }
}

impl Classifier for ClassifierModel {
    fn describe(&self) -> String {
        format!(
            "{} ({} classes, {} features)",
            self.kind(),
            self.classes().len(),
            self.n_features()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string())
        )
    }

    fn predict(&self, x: &Array2<f64>, names: &[&str]) -> Result<Vec<Label>> {
        self.check_input(x, names)?;
        let classes = self.classes();

        let scores = match self {
            ClassifierModel::LinearSvc {
                coef, intercept, ..
            } => {
                let scores = Self::decision_function(coef, intercept, x);
                if scores.ncols() == 1 {
                    return Ok(scores
                        .column(0)
                        .iter()
                        .map(|&z| classes[usize::from(z > 0.0)].clone())
                        .collect());
                }
                scores
            }
            _ => self.probabilities(x).ok_or_else(|| {
                PredictError::InvalidModel(format!("{} produced no class scores", self.kind()))
            })?,
        };

        Ok(scores
            .axis_iter(Axis(0))
            .map(|row| classes[argmax(row)].clone())
            .collect())
    }

    fn predict_proba(&self, x: &Array2<f64>, names: &[&str]) -> Option<Result<Array2<f64>>> {
        if matches!(self, ClassifierModel::LinearSvc { .. }) {
            return None;
        }
        Some(
            self.check_input(x, names)
                .and_then(|_| {
                    self.probabilities(x).ok_or_else(|| {
                        PredictError::InvalidModel(format!(
                            "{} produced no probabilities",
                            self.kind()
                        ))
                    })
                }),
        )
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn softmax_inplace(row: &mut [f64]) {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        total += *v;
    }
    for v in row.iter_mut() {
        *v /= total;
    }
}

/// Index of the first maximum; NaN never wins.
fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (k, &v) in row.iter().enumerate() {
        if v > best_value {
            best = k;
            best_value = v;
        }
    }
    best
}
