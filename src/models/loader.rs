//! Artifact loader for the scaler and the two classifiers

use crate::config::ModelsConfig;
use crate::error::{PredictError, Result};
use crate::models::classifier::ClassifierModel;
use crate::models::scaler::Scaler;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything loaded from a model directory for one run
#[derive(Debug, Clone)]
pub struct LoadedModels {
    /// `None` when the classifiers were trained on raw features
    pub scaler: Option<Scaler>,
    pub primary: ClassifierModel,
    pub secondary: ClassifierModel,
}

/// Resolves and deserializes the artifacts under a model directory
pub struct ModelLoader {
    model_dir: PathBuf,
    scaler_file: String,
    primary_file: String,
    secondary_file: String,
}

impl ModelLoader {
    /// Create a loader with the default artifact file names.
    pub fn new<P: AsRef<Path>>(model_dir: P) -> Self {
        Self::from_config(&ModelsConfig {
            model_dir: model_dir.as_ref().to_path_buf(),
            ..ModelsConfig::default()
        })
    }

    pub fn from_config(config: &ModelsConfig) -> Self {
        Self {
            model_dir: config.model_dir.clone(),
            scaler_file: config.scaler_file.clone(),
            primary_file: config.primary_file.clone(),
            secondary_file: config.secondary_file.clone(),
        }
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir.join(&self.scaler_file)
    }

    pub fn primary_path(&self) -> PathBuf {
        self.model_dir.join(&self.primary_file)
    }

    pub fn secondary_path(&self) -> PathBuf {
        self.model_dir.join(&self.secondary_file)
    }

    /// Load the optional scaler and both required classifiers.
    ///
    /// Both classifier paths are checked for existence before either is decoded.
    pub fn load_all(&self) -> Result<LoadedModels> {
        let scaler_path = self.scaler_path();
        let primary_path = self.primary_path();
        let secondary_path = self.secondary_path();

        let scaler = if scaler_path.exists() {
            let scaler: Scaler = read_artifact(&scaler_path)?;
            scaler.validate()?;
            info!(path = %scaler_path.display(), kind = scaler.kind(), "Loaded scaler");
            Some(scaler)
        } else {
            info!(
                path = %scaler_path.display(),
                "No scaler found (expected if models use raw features)"
            );
            None
        };

        if !primary_path.exists() {
            return Err(PredictError::MissingRequiredArtifact {
                name: "Logistic Regression".to_string(),
                path: primary_path,
            });
        }
        if !secondary_path.exists() {
            return Err(PredictError::MissingRequiredArtifact {
                name: "Random Forest".to_string(),
                path: secondary_path,
            });
        }

        let primary = load_classifier(&primary_path)?;
        let secondary = load_classifier(&secondary_path)?;

        Ok(LoadedModels {
            scaler,
            primary,
            secondary,
        })
    }
}

/// Load the artifacts under `model_dir` using the default file names.
pub fn load_models<P: AsRef<Path>>(
    model_dir: P,
) -> Result<(Option<Scaler>, ClassifierModel, ClassifierModel)> {
    let models = ModelLoader::new(model_dir).load_all()?;
    Ok((models.scaler, models.primary, models.secondary))
}

fn load_classifier(path: &Path) -> Result<ClassifierModel> {
    let model: ClassifierModel = read_artifact(path)?;
    model.validate()?;
    info!(path = %path.display(), kind = model.kind(), "Loaded classifier");
    Ok(model)
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| PredictError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| PredictError::ArtifactDecode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LR: &str = r#"{"kind": "logistic_regression", "classes": [0, 1], "coef": [[1.0]], "intercept": [0.0]}"#;
    const RF: &str = r#"{
        "kind": "random_forest",
        "classes": [0, 1],
        "trees": [{
            "children_left": [-1],
            "children_right": [-1],
            "feature": [-2],
            "threshold": [-2.0],
            "value": [[1.0, 4.0]]
        }]
    }"#;
    const SCALER: &str = r#"{"kind": "standard", "mean": [0.0], "scale": [1.0]}"#;

    fn write_models(dir: &Path, scaler: bool, lr: bool, rf: bool) {
        if scaler {
            fs::write(dir.join("scaler.json"), SCALER).unwrap();
        }
        if lr {
            fs::write(dir.join("logistic_regression_model.json"), LR).unwrap();
        }
        if rf {
            fs::write(dir.join("random_forest_model.json"), RF).unwrap();
        }
    }

    #[test]
    fn test_load_all_models() {
        let dir = tempfile::tempdir().unwrap();
        write_models(dir.path(), true, true, true);

        let (scaler, lr, rf) = load_models(dir.path()).unwrap();
        assert!(scaler.is_some());
        assert_eq!(lr.kind(), "logistic_regression");
        assert_eq!(rf.kind(), "random_forest");
    }

    #[test]
    fn test_missing_scaler_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_models(dir.path(), false, true, true);

        let (scaler, _, _) = load_models(dir.path()).unwrap();
        assert!(scaler.is_none());
    }

    #[test]
    fn test_missing_primary_names_path() {
        let dir = tempfile::tempdir().unwrap();
        write_models(dir.path(), true, false, true);

        match load_models(dir.path()) {
            Err(PredictError::MissingRequiredArtifact { path, .. }) => {
                assert_eq!(path, dir.path().join("logistic_regression_model.json"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_secondary_names_path() {
        let dir = tempfile::tempdir().unwrap();
        write_models(dir.path(), false, true, false);

        match load_models(dir.path()) {
            Err(PredictError::MissingRequiredArtifact { path, .. }) => {
                assert_eq!(path, dir.path().join("random_forest_model.json"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_malformed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write_models(dir.path(), false, true, true);
        fs::write(dir.path().join("random_forest_model.json"), "{not json").unwrap();

        assert!(matches!(
            load_models(dir.path()),
            Err(PredictError::ArtifactDecode { .. })
        ));
    }

    #[test]
    fn test_custom_file_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), LR).unwrap();
        fs::write(dir.path().join("b.json"), RF).unwrap();

        let loader = ModelLoader::from_config(&ModelsConfig {
            model_dir: dir.path().to_path_buf(),
            primary_file: "a.json".to_string(),
            secondary_file: "b.json".to_string(),
            ..ModelsConfig::default()
        });
        let models = loader.load_all().unwrap();
        assert!(models.scaler.is_none());
    }
}
