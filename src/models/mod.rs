//! Fitted model artifacts and inference

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod scaler;

pub use classifier::{Classifier, ClassifierModel};
pub use inference::InferenceEngine;
pub use loader::{LoadedModels, ModelLoader};
pub use scaler::Scaler;
