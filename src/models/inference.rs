//! Two-classifier prediction over a feature table

use crate::config::ModelsConfig;
use crate::error::Result;
use crate::features::prepare_features;
use crate::metrics::RunMetrics;
use crate::models::classifier::Classifier;
use crate::models::loader::LoadedModels;
use crate::models::scaler::Scaler;
use crate::types::prediction::{ModelOutput, PredictionTable};
use crate::types::table::FeatureTable;
use ndarray::Array2;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_PRIMARY_PREFIX: &str = "LR";
pub const DEFAULT_SECONDARY_PREFIX: &str = "RF";

/// Predict with both classifiers and assemble the result table.
///
/// The identifier column, when named and present, is set aside untouched and
/// dropped from the features. Output columns are
/// `[id_col, LR_PRED, LR_PROB, RF_PRED, RF_PROB]` in input row order.
pub fn predict_df(
    table: &FeatureTable,
    primary: &dyn Classifier,
    secondary: &dyn Classifier,
    scaler: Option<&Scaler>,
    id_col: Option<&str>,
) -> Result<PredictionTable> {
    predict_with(
        table,
        [
            (DEFAULT_PRIMARY_PREFIX, primary),
            (DEFAULT_SECONDARY_PREFIX, secondary),
        ],
        scaler,
        id_col,
        None,
    )
}

fn predict_with(
    table: &FeatureTable,
    models: [(&str, &dyn Classifier); 2],
    scaler: Option<&Scaler>,
    id_col: Option<&str>,
    metrics: Option<&RunMetrics>,
) -> Result<PredictionTable> {
    let id = id_col.and_then(|name| table.column(name)).cloned();
    let drop_cols: Vec<&str> = id_col.into_iter().collect();

    let aligned = prepare_features(table, scaler, &drop_cols)?;
    let names = aligned.column_names();
    let matrix = aligned.to_matrix()?;

    let mut outputs = Vec::with_capacity(models.len());
    for (prefix, model) in models {
        let start = Instant::now();
        let output = run_classifier(prefix, model, &matrix, &names)?;
        if let Some(metrics) = metrics {
            metrics.record_model(prefix, start.elapsed(), &output.labels);
        }
        outputs.push(output);
    }

    Ok(PredictionTable::new(id, outputs, table.n_rows()))
}

fn run_classifier(
    prefix: &str,
    model: &dyn Classifier,
    matrix: &Array2<f64>,
    names: &[&str],
) -> Result<ModelOutput> {
    let labels = model.predict(matrix, names)?;

    let probabilities = match model.predict_proba(matrix, names) {
        Some(proba) => {
            let proba = proba?;
            if proba.ncols() >= 2 {
                Some(proba.column(1).to_vec())
            } else {
                warn!(
                    model = %prefix,
                    classes = proba.ncols(),
                    "Probability matrix has no positive-class column"
                );
                None
            }
        }
        None => {
            debug!(model = %prefix, "Classifier has no probability estimates");
            None
        }
    };

    Ok(ModelOutput {
        prefix: prefix.to_string(),
        labels,
        probabilities,
    })
}

/// Loaded artifacts plus the output naming for one run
pub struct InferenceEngine {
    models: LoadedModels,
    primary_prefix: String,
    secondary_prefix: String,
}

impl InferenceEngine {
    pub fn new(models: LoadedModels, config: &ModelsConfig) -> Self {
        info!(
            primary = %models.primary.describe(),
            secondary = %models.secondary.describe(),
            scaled = models.scaler.is_some(),
            "Inference engine initialized"
        );
        Self {
            models,
            primary_prefix: config.primary_prefix.clone(),
            secondary_prefix: config.secondary_prefix.clone(),
        }
    }

    /// Run both classifiers over `table`, recording per-model timings.
    pub fn predict(
        &self,
        table: &FeatureTable,
        id_col: Option<&str>,
        metrics: &RunMetrics,
    ) -> Result<PredictionTable> {
        let result = predict_with(
            table,
            [
                (
                    self.primary_prefix.as_str(),
                    &self.models.primary as &dyn Classifier,
                ),
                (
                    self.secondary_prefix.as_str(),
                    &self.models.secondary as &dyn Classifier,
                ),
            ],
            self.models.scaler.as_ref(),
            id_col,
            Some(metrics),
        )?;
        metrics.record_agreement(&result.outputs[0].labels, &result.outputs[1].labels);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictError;
    use crate::models::classifier::ClassifierModel;
    use crate::types::prediction::Label;
    use crate::types::table::{Column, ColumnData};

    /// Predicts a fixed label, optionally with a fixed positive-class probability.
    struct FixedClassifier {
        label: i64,
        probability: Option<f64>,
    }

    impl Classifier for FixedClassifier {
        fn describe(&self) -> String {
            "fixed".to_string()
        }

        fn predict(&self, x: &Array2<f64>, _names: &[&str]) -> Result<Vec<Label>> {
            Ok(vec![Label::Int(self.label); x.nrows()])
        }

        fn predict_proba(&self, x: &Array2<f64>, _names: &[&str]) -> Option<Result<Array2<f64>>> {
            self.probability.map(|p| {
                let mut proba = Array2::zeros((x.nrows(), 2));
                proba.column_mut(0).fill(1.0 - p);
                proba.column_mut(1).fill(p);
                Ok(proba)
            })
        }
    }

    fn table() -> FeatureTable {
        FeatureTable::new(vec![
            Column::new("cust_id", ColumnData::Int(vec![1, 2, 3])),
            Column::new("a", ColumnData::Float(vec![0.1, 0.2, 0.3])),
            Column::new("b", ColumnData::Float(vec![1.0, 2.0, 3.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_identifier_is_first_column() {
        let lr = FixedClassifier { label: 1, probability: Some(0.8) };
        let rf = FixedClassifier { label: 1, probability: Some(0.8) };

        let result = predict_df(&table(), &lr, &rf, None, Some("cust_id")).unwrap();
        assert_eq!(
            result.headers(),
            vec!["cust_id", "LR_PRED", "LR_PROB", "RF_PRED", "RF_PROB"]
        );
        assert_eq!(result.n_rows(), 3);
        assert_eq!(result.row(0), vec!["1", "1", "0.8", "1", "0.8"]);
        assert_eq!(result.row(2), vec!["3", "1", "0.8", "1", "0.8"]);
    }

    #[test]
    fn test_no_identifier_column() {
        let lr = FixedClassifier { label: 0, probability: Some(0.3) };
        let rf = FixedClassifier { label: 1, probability: Some(0.6) };

        let result = predict_df(&table(), &lr, &rf, None, None).unwrap();
        assert_eq!(result.headers(), vec!["LR_PRED", "LR_PROB", "RF_PRED", "RF_PROB"]);
        assert!(result.id.is_none());
    }

    #[test]
    fn test_unknown_identifier_is_ignored() {
        let lr = FixedClassifier { label: 0, probability: None };
        let rf = FixedClassifier { label: 0, probability: None };

        let result = predict_df(&table(), &lr, &rf, None, Some("missing")).unwrap();
        assert!(result.id.is_none());
        assert_eq!(result.n_rows(), 3);
    }

    #[test]
    fn test_missing_probability_column_is_empty() {
        let lr = FixedClassifier { label: 1, probability: Some(0.9) };
        let rf = FixedClassifier { label: 0, probability: None };

        let result = predict_df(&table(), &lr, &rf, None, Some("cust_id")).unwrap();
        let rf_output = result.output("RF").unwrap();
        assert!(rf_output.probabilities.is_none());
        assert_eq!(rf_output.labels.len(), 3);
        assert_eq!(result.row(1), vec!["2", "1", "0.9", "0", ""]);
    }

    #[test]
    fn test_inconsistent_classifier_returns_error() {
        let lr = ClassifierModel::LogisticRegression {
            classes: vec![Label::Int(0), Label::Int(1)],
            coef: vec![vec![1.0, 1.0]; 3],
            intercept: vec![0.0; 3],
            feature_names_in: None,
        };
        let rf = FixedClassifier { label: 0, probability: None };

        let result = predict_df(&table(), &lr, &rf, None, Some("cust_id"));
        assert!(matches!(result, Err(PredictError::InvalidModel(_))));
    }

    #[test]
    fn test_scaler_without_numeric_columns_fails() {
        let text_only = FeatureTable::new(vec![Column::new(
            "segment",
            ColumnData::Text(vec!["a".into(), "b".into()]),
        )])
        .unwrap();
        let scaler = Scaler::Standard {
            mean: None,
            scale: None,
            feature_names_in: None,
        };
        let lr = FixedClassifier { label: 1, probability: None };
        let rf = FixedClassifier { label: 1, probability: None };

        let result = predict_df(&text_only, &lr, &rf, Some(&scaler), None);
        assert!(matches!(result, Err(PredictError::NoNumericColumns)));
    }

    #[test]
    fn test_engine_uses_configured_prefixes() {
        let models = LoadedModels {
            scaler: None,
            primary: serde_json::from_str(
                r#"{"kind": "linear_svc", "classes": [0, 1], "coef": [[1.0, 0.0]], "intercept": [-0.15]}"#,
            )
            .unwrap(),
            secondary: serde_json::from_str(
                r#"{"kind": "logistic_regression", "classes": [0, 1], "coef": [[0.0, 0.0]], "intercept": [0.0]}"#,
            )
            .unwrap(),
        };
        let config = ModelsConfig {
            primary_prefix: "SVC".to_string(),
            secondary_prefix: "LOGIT".to_string(),
            ..ModelsConfig::default()
        };
        let engine = InferenceEngine::new(models, &config);
        let metrics = RunMetrics::new();

        let result = engine.predict(&table(), Some("cust_id"), &metrics).unwrap();
        assert_eq!(
            result.headers(),
            vec!["cust_id", "SVC_PRED", "SVC_PROB", "LOGIT_PRED", "LOGIT_PROB"]
        );
        assert_eq!(
            result.output("SVC").unwrap().labels,
            vec![Label::Int(0), Label::Int(1), Label::Int(1)]
        );
        assert_eq!(result.row(0)[4], "0.5");
        assert_eq!(metrics.rows_agreeing(), 1);
    }
}
