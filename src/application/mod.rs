pub mod use_cases;

pub use use_cases::batch_predictor::BatchPredictor;
pub use use_cases::cleaner::MatrixCleaner;
pub use use_cases::schema_aligner::align;
