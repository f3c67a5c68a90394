pub mod error;
pub mod model;

// Batch attack classification
pub mod detection;
