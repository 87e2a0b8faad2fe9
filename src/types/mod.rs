//! Type definitions for tables and predictions

pub mod prediction;
pub mod table;

pub use prediction::{Label, ModelOutput, PredictionTable};
pub use table::{Column, ColumnData, FeatureTable};
