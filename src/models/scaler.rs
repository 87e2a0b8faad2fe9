//! Fitted numeric scalers

use crate::error::{PredictError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Previously-fitted numeric transform, tagged by `kind` in its artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard {
        #[serde(default)]
        mean: Option<Vec<f64>>,
        #[serde(default)]
        scale: Option<Vec<f64>>,
        #[serde(default)]
        feature_names_in: Option<Vec<String>>,
    },
    /// `x * scale + min`
    MinMax {
        min: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default)]
        feature_names_in: Option<Vec<String>>,
    },
}

impl Scaler {
    pub fn kind(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    /// Number of features the scaler was fitted on, if it can tell.
    pub fn n_features(&self) -> Option<usize> {
        match self {
            Scaler::Standard {
                mean,
                scale,
                feature_names_in,
            } => mean
                .as_ref()
                .map(Vec::len)
                .or_else(|| scale.as_ref().map(Vec::len))
                .or_else(|| feature_names_in.as_ref().map(Vec::len)),
            Scaler::MinMax { min, .. } => Some(min.len()),
        }
    }

    pub fn feature_names_in(&self) -> Option<&[String]> {
        match self {
            Scaler::Standard {
                feature_names_in, ..
            }
            | Scaler::MinMax {
                feature_names_in, ..
            } => feature_names_in.as_deref(),
        }
    }

    /// Check internal consistency of the fitted parameters.
    pub fn validate(&self) -> Result<()> {
        let lengths: Vec<(&str, usize)> = match self {
            Scaler::Standard {
                mean,
                scale,
                feature_names_in,
            } => [
                ("mean", mean.as_ref().map(Vec::len)),
                ("scale", scale.as_ref().map(Vec::len)),
                ("feature_names_in", feature_names_in.as_ref().map(Vec::len)),
            ]
            .into_iter()
            .filter_map(|(name, len)| len.map(|l| (name, l)))
            .collect(),
            Scaler::MinMax {
                min,
                scale,
                feature_names_in,
            } => {
                let mut lengths = vec![("min", min.len()), ("scale", scale.len())];
                if let Some(names) = feature_names_in {
                    lengths.push(("feature_names_in", names.len()));
                }
                lengths
            }
        };

        if let Some((_, expected)) = lengths.first() {
            if let Some((name, len)) = lengths.iter().find(|(_, len)| len != expected) {
                return Err(PredictError::InvalidModel(format!(
                    "{} scaler: '{}' has {} entries, expected {}",
                    self.kind(),
                    name,
                    len,
                    expected
                )));
            }
        }
        Ok(())
    }

    /// Transform a `rows x features` matrix whose columns are named `names`.
    pub fn transform(&self, x: &Array2<f64>, names: &[&str]) -> Result<Array2<f64>> {
        self.validate()?;
        check_features(self.n_features(), self.feature_names_in(), x, names, "scaler")?;

        let mut out = x.clone();
        match self {
            Scaler::Standard { mean, scale, .. } => {
                for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
                    let center = mean.as_ref().map(|m| m[j]).unwrap_or(0.0);
                    let divisor = scale
                        .as_ref()
                        .map(|s| s[j])
                        .filter(|&s| s != 0.0)
                        .unwrap_or(1.0);
                    column.mapv_inplace(|v| (v - center) / divisor);
                }
            }
            Scaler::MinMax { min, scale, .. } => {
                for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
                    let (offset, factor) = (min[j], scale[j]);
                    column.mapv_inplace(|v| v * factor + offset);
                }
            }
        }
        Ok(out)
    }
}

/// Shared shape and name check for fitted estimators.
pub(crate) fn check_features(
    n_features: Option<usize>,
    feature_names_in: Option<&[String]>,
    x: &Array2<f64>,
    names: &[&str],
    estimator: &str,
) -> Result<()> {
    if let Some(expected) = n_features {
        if x.ncols() != expected {
            return Err(PredictError::FeatureMismatch(format!(
                "{} expects {} features, got {}",
                estimator,
                expected,
                x.ncols()
            )));
        }
    }
    if let Some(fitted) = feature_names_in {
        if fitted.iter().map(String::as_str).ne(names.iter().copied()) {
            return Err(PredictError::FeatureMismatch(format!(
                "{} was fitted on columns {:?}, got {:?}",
                estimator, fitted, names
            )));
        }
    }
    Ok(())
}
