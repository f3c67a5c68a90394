// ============================================================
// FEATURE SCHEMA
// ============================================================
// Ordered list of feature columns the classifier was trained on

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::error::{AppError, Result};

/// Ordered, immutable list of feature names.
///
/// Cloning shares the underlying storage, so every aligned matrix can carry
/// its column names without copying them per chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Arc<[String]>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty lists and repeated names
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(AppError::ValidationError(
                "Feature schema must contain at least one feature".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Feature schema lists '{}' more than once",
                    name
                )));
            }
        }

        Ok(Self {
            names: names.into(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
