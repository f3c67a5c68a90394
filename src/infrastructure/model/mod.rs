// ============================================================
// MODEL ARTIFACTS
// ============================================================
// JSON-exported feature list, decision forest and label encoder

mod artifacts;
mod forest;
mod label_encoder;

pub use artifacts::{load_feature_schema, load_model_context, ModelArtifactLayout};
pub use forest::{DecisionTree, ForestClassifier};
pub use label_encoder::LabelEncoder;
