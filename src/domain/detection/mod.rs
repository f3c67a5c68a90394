// ============================================================
// DETECTION DOMAIN LAYER
// ============================================================
// Core types and value objects for batch attack classification
// No I/O, no async, no external dependencies beyond serde

mod feature_schema;
mod matrix;
mod pipeline_config;
mod scan_report;

pub use feature_schema::FeatureSchema;
pub use matrix::{AlignedMatrix, Cell, NumericMatrix, RawChunk};
pub use pipeline_config::PipelineConfig;
pub use scan_report::{LabelCount, PreviewBuffer, ResultTally, ScanReport};

/// Label a classifier emits for traffic with no attack in it.
pub const BASELINE_LABEL: &str = "BENIGN";

/// Header of the single column in the prediction file.
pub const OUTPUT_COLUMN: &str = "Attack Type";
