use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::error::{AppError, Result};
use crate::domain::model::LabelDecoder;

/// Id-to-label table exported alongside the classifier.
///
/// Id `k` decodes to `classes[k]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(AppError::ModelError(
                "Label encoder has no classes".to_string(),
            ));
        }
        Ok(Self { classes })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!(
                "Failed to read label encoder {}: {}",
                path.display(),
                e
            ))
        })?;
        let encoder: Self = serde_json::from_str(&content).map_err(|e| {
            AppError::ModelError(format!(
                "Failed to parse label encoder {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::new(encoder.classes)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl LabelDecoder for LabelEncoder {
    fn decode(&self, ids: &[usize]) -> Result<Vec<String>> {
        ids.iter()
            .map(|&id| {
                self.classes.get(id).cloned().ok_or_else(|| {
                    AppError::ModelError(format!(
                        "Cannot decode previously unseen label id {}",
                        id
                    ))
                })
            })
            .collect()
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> LabelEncoder {
        LabelEncoder::new(vec!["BENIGN".into(), "DoS".into()]).unwrap()
    }

    #[test]
    fn test_decodes_ids_in_order() {
        let labels = encoder().decode(&[0, 1, 0]).unwrap();
        assert_eq!(labels, vec!["BENIGN", "DoS", "BENIGN"]);
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let err = encoder().decode(&[0, 7]).unwrap_err();
        assert!(err.to_string().contains("unseen label id 7"));
    }

    #[test]
    fn test_parses_classes_json() {
        let encoder: LabelEncoder =
            serde_json::from_str(r#"{"classes": ["BENIGN", "PortScan"]}"#).unwrap();
        assert_eq!(encoder.classes(), &["BENIGN", "PortScan"]);
    }
}
