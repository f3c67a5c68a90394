use std::sync::Arc;

use crate::domain::detection::{FeatureSchema, NumericMatrix};
use crate::domain::error::{AppError, Result};

/// Maps a cleaned feature matrix to one class id per row.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &NumericMatrix) -> Result<Vec<usize>>;

    /// Number of input features the model was trained on, when known
    fn n_features(&self) -> Option<usize> {
        None
    }
}

/// Maps class ids back to human-readable labels.
pub trait LabelDecoder: Send + Sync {
    fn decode(&self, ids: &[usize]) -> Result<Vec<String>>;

    /// Every label the decoder can produce, ordered by id
    fn classes(&self) -> &[String];
}

/// Process-wide, read-only model state handed to the predictor.
#[derive(Clone)]
pub struct ModelContext {
    pub schema: FeatureSchema,
    pub classifier: Arc<dyn Classifier>,
    pub decoder: Arc<dyn LabelDecoder>,
}

impl ModelContext {
    pub fn new(
        schema: FeatureSchema,
        classifier: Arc<dyn Classifier>,
        decoder: Arc<dyn LabelDecoder>,
    ) -> Result<Self> {
        if let Some(n_features) = classifier.n_features() {
            if n_features != schema.len() {
                return Err(AppError::ModelError(format!(
                    "Classifier expects {} features but the schema lists {}",
                    n_features,
                    schema.len()
                )));
            }
        }

        Ok(Self {
            schema,
            classifier,
            decoder,
        })
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("schema", &self.schema)
            .field("classes", &self.decoder.classes())
            .finish()
    }
}
