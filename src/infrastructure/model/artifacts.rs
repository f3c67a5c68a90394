use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::domain::detection::FeatureSchema;
use crate::domain::error::{AppError, Result};
use crate::domain::model::ModelContext;

use super::{ForestClassifier, LabelEncoder};

/// File layout of an exported model directory.
#[derive(Debug, Clone)]
pub struct ModelArtifactLayout {
    root: PathBuf,
}

impl ModelArtifactLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn features_path(&self) -> PathBuf {
        self.root.join("features.json")
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join("model.json")
    }

    pub fn label_encoder_path(&self) -> PathBuf {
        self.root.join("label_encoder.json")
    }
}

pub fn load_feature_schema(path: &Path) -> Result<FeatureSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::IoError(format!(
            "Failed to read feature list {}: {}",
            path.display(),
            e
        ))
    })?;
    let names: Vec<String> = serde_json::from_str(&content).map_err(|e| {
        AppError::ModelError(format!(
            "Failed to parse feature list {}: {}",
            path.display(),
            e
        ))
    })?;
    FeatureSchema::new(names)
}

/// Load schema, classifier and label encoder and check they fit together
pub fn load_model_context(layout: &ModelArtifactLayout) -> Result<ModelContext> {
    let schema = load_feature_schema(&layout.features_path())?;
    let forest = ForestClassifier::load(&layout.model_path())?;
    let encoder = LabelEncoder::load(&layout.label_encoder_path())?;

    if forest.n_classes > encoder.len() {
        return Err(AppError::ModelError(format!(
            "Model predicts {} classes but the label encoder only knows {}",
            forest.n_classes,
            encoder.len()
        )));
    }

    info!(
        model_dir = %layout.root().display(),
        features = schema.len(),
        trees = forest.trees.len(),
        classes = encoder.len(),
        "Loaded model artifacts"
    );

    ModelContext::new(schema, Arc::new(forest), Arc::new(encoder))
}
