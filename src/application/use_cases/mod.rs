pub mod batch_predictor;
pub mod cleaner;
pub mod schema_aligner;
