// ============================================================
// PIPELINE CONFIGURATION
// ============================================================
// Tunables for chunked batch prediction

use serde::{Deserialize, Serialize};

use super::{BASELINE_LABEL, OUTPUT_COLUMN};

/// Configuration for the streaming predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows read and classified per chunk (default: 50_000)
    /// Bounds peak memory independent of the input size
    pub chunk_size: usize,

    /// Maximum number of result rows kept for preview (default: 100)
    pub preview_limit: usize,

    /// Values are clipped into [-clip_bound, clip_bound] (default: 1e6)
    pub clip_bound: f64,

    /// Label that means "no attack"; excluded from the headline (default: BENIGN)
    pub baseline_label: String,

    /// Header of the prediction file column (default: "Attack Type")
    pub output_column: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50_000,
            preview_limit: 100,
            clip_bound: 1e6,
            baseline_label: BASELINE_LABEL.to_string(),
            output_column: OUTPUT_COLUMN.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }
        if self.preview_limit == 0 {
            return Err("preview_limit must be > 0".to_string());
        }
        if !self.clip_bound.is_finite() || self.clip_bound <= 0.0 {
            return Err("clip_bound must be a finite positive number".to_string());
        }
        if self.baseline_label.trim().is_empty() {
            return Err("baseline_label must not be empty".to_string());
        }
        if self.output_column.trim().is_empty() {
            return Err("output_column must not be empty".to_string());
        }
        Ok(())
    }
}
