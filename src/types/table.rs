//! Column-typed in-memory table

use crate::error::{PredictError, Result};
use ndarray::Array2;

/// Cells read as missing values, the same set pandas' `read_csv` uses by default.
const MISSING_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(cell: &str) -> bool {
    MISSING_VALUES.contains(&cell)
}

/// Values of a single column.
///
/// Dtypes are inferred once when the table is read and never change afterwards,
/// except that scaling turns integer columns into float columns.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    /// Infer the narrowest dtype that holds every cell.
    ///
    /// All cells parse as `i64` gives an integer column. All cells that are
    /// not missing-value markers parse as `f64` gives a float column with the
    /// markers as NaN. Anything else stays text, as does a column with no
    /// cells at all.
    pub fn infer(cells: Vec<String>) -> Self {
        if cells.is_empty() {
            return ColumnData::Text(cells);
        }
        if let Ok(ints) = cells
            .iter()
            .map(|c| c.trim().parse::<i64>())
            .collect::<std::result::Result<Vec<_>, _>>()
        {
            return ColumnData::Int(ints);
        }

        let floats: Option<Vec<f64>> = cells
            .iter()
            .map(|c| {
                let c = c.trim();
                if is_missing(c) {
                    Some(f64::NAN)
                } else {
                    c.parse::<f64>().ok()
                }
            })
            .collect();

        match floats {
            Some(values) => ColumnData::Float(values),
            None => ColumnData::Text(cells),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnData::Text(_))
    }

    /// Numeric view of the column, `None` for text.
    pub fn as_f64(&self) -> Option<Vec<f64>> {
        match self {
            ColumnData::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            ColumnData::Text(_) => None,
        }
    }

    /// Render one cell the way it is written to CSV.
    pub fn format_cell(&self, row: usize) -> String {
        match self {
            ColumnData::Int(v) => v[row].to_string(),
            ColumnData::Float(v) => format_float(v[row]),
            ColumnData::Text(v) => v[row].clone(),
        }
    }
}

/// Floats are written in shortest round-trip form, NaN as an empty cell.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Ordered collection of equally long named columns, one row per entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl FeatureTable {
    /// Build a table, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.data.len() != n_rows) {
            return Err(PredictError::FeatureMismatch(format!(
                "column '{}' has {} rows, expected {}",
                bad.name,
                bad.data.len(),
                n_rows
            )));
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Remove a column by name, returning it if it was present.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Names of the numeric columns, left to right.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.data.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Dense `rows x columns` matrix of every column.
    ///
    /// Fails on the first text column.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let mut matrix = Array2::<f64>::zeros((self.n_rows, self.columns.len()));
        for (j, column) in self.columns.iter().enumerate() {
            let values = column
                .data
                .as_f64()
                .ok_or_else(|| PredictError::NonNumericFeature(column.name.clone()))?;
            for (i, value) in values.into_iter().enumerate() {
                matrix[[i, j]] = value;
            }
        }
        Ok(matrix)
    }
}
