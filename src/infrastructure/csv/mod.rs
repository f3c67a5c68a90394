// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Chunked CSV reading with encoding fallback, incremental prediction output

mod chunk_reader;
mod prediction_writer;

pub use chunk_reader::ChunkReader;
pub use prediction_writer::PredictionWriter;
