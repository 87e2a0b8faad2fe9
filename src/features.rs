//! Feature alignment for model inference.
//!
//! Reproduces the numeric transform used at training time so the classifiers
//! see features on the same scale they were fitted on.

use crate::error::{PredictError, Result};
use crate::models::scaler::Scaler;
use crate::types::table::{ColumnData, FeatureTable};
use ndarray::Array2;
use tracing::debug;

/// Copy `table`, drop the named columns that are present, and apply `scaler`
/// to the numeric columns in their left-to-right order.
///
/// Names in `drop_cols` that are not columns of the table are skipped. Without
/// a scaler the column-dropped copy is returned as is. Non-numeric columns are
/// never touched.
pub fn prepare_features(
    table: &FeatureTable,
    scaler: Option<&Scaler>,
    drop_cols: &[&str],
) -> Result<FeatureTable> {
    let mut aligned = table.clone();
    for name in drop_cols {
        if aligned.drop_column(name).is_some() {
            debug!(column = %name, "Dropped column before inference");
        }
    }

    let Some(scaler) = scaler else {
        return Ok(aligned);
    };

    let numeric: Vec<usize> = aligned
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.data.is_numeric())
        .map(|(i, _)| i)
        .collect();
    if numeric.is_empty() {
        return Err(PredictError::NoNumericColumns);
    }

    let names: Vec<&str> = numeric
        .iter()
        .map(|&i| aligned.columns()[i].name.as_str())
        .collect();
    let mut matrix = Array2::<f64>::zeros((aligned.n_rows(), numeric.len()));
    for (j, &i) in numeric.iter().enumerate() {
        if let Some(values) = aligned.columns()[i].data.as_f64() {
            for (row, value) in values.into_iter().enumerate() {
                matrix[[row, j]] = value;
            }
        }
    }

    let scaled = scaler.transform(&matrix, &names)?;
    debug!(
        scaler = scaler.kind(),
        columns = numeric.len(),
        "Scaled numeric columns"
    );

    let columns = aligned.columns_mut();
    for (j, &i) in numeric.iter().enumerate() {
        columns[i].data = ColumnData::Float(scaled.column(j).to_vec());
    }
    Ok(aligned)
}
