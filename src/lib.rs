//! Batch Prediction Library
//!
//! Applies a previously-fitted scaler and two previously-fitted classifiers to
//! a CSV of cleaned feature rows and assembles labels and positive-class
//! probabilities into a result table.

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod table_io;
pub mod types;

pub use config::AppConfig;
pub use error::{PredictError, Result};
pub use features::prepare_features;
pub use models::classifier::{Classifier, ClassifierModel};
pub use models::inference::{predict_df, InferenceEngine};
pub use models::loader::{load_models, ModelLoader};
pub use models::scaler::Scaler;
pub use types::{FeatureTable, Label, PredictionTable};
