//! Error taxonomy for the prediction pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictError>;

/// Fatal conditions that abort a prediction run.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Input table does not exist
    #[error("Input file not found: {}", .0.display())]
    MissingInputFile(PathBuf),

    /// A required classifier artifact is absent from the model directory
    #[error("{name} model not found at {}", path.display())]
    MissingRequiredArtifact { name: String, path: PathBuf },

    /// Artifact exists but could not be read or decoded
    #[error("Failed to decode artifact {}: {source}", path.display())]
    ArtifactDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A scaler is present but the table has no numeric columns
    #[error("No numeric columns found to scale.")]
    NoNumericColumns,

    /// Table shape or column names disagree with what an estimator was fitted on
    #[error("Feature mismatch: {0}")]
    FeatureMismatch(String),

    /// A text column reached a classifier
    #[error("Column '{0}' is not numeric and cannot be used as a model feature")]
    NonNumericFeature(String),

    /// Fitted parameters are internally inconsistent
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PredictError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
