// ============================================================
// BATCH PREDICTOR USE CASE
// ============================================================
// Stream a CSV through align -> clean -> classify -> decode -> write

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::application::use_cases::cleaner::MatrixCleaner;
use crate::application::use_cases::schema_aligner::align;
use crate::domain::detection::{PipelineConfig, PreviewBuffer, RawChunk, ResultTally, ScanReport};
use crate::domain::error::{AppError, Result};
use crate::domain::model::ModelContext;
use crate::infrastructure::csv::{ChunkReader, PredictionWriter};

/// Chunked batch prediction over an uploaded file.
///
/// Memory stays bounded by one chunk plus the preview and the tally, no
/// matter how large the input is. Operations on the same output path must
/// not run concurrently.
pub struct BatchPredictor {
    context: ModelContext,
    config: PipelineConfig,
    cleaner: MatrixCleaner,
}

impl BatchPredictor {
    pub fn new(context: ModelContext, config: PipelineConfig) -> Result<Self> {
        config.validate().map_err(|e| {
            AppError::ValidationError(format!("Invalid pipeline config: {}", e))
        })?;

        let cleaner = MatrixCleaner::new(config.clip_bound);
        Ok(Self {
            context,
            config,
            cleaner,
        })
    }

    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify every row of `input` and write the labels to `output`.
    ///
    /// Any previous file at `output` is removed first. On error the chunks
    /// written so far stay on disk and no report is returned.
    pub fn run(&self, input: &Path, output: &Path) -> Result<ScanReport> {
        let writer = PredictionWriter::create(output, &self.config.output_column)?;
        let reader = ChunkReader::open(input, self.config.chunk_size)?;
        info!(
            input = %input.display(),
            output = %output.display(),
            chunk_size = self.config.chunk_size,
            "Starting batch prediction"
        );
        self.stream(reader, writer)
    }

    fn stream<R: Read>(
        &self,
        mut reader: ChunkReader<R>,
        mut writer: PredictionWriter,
    ) -> Result<ScanReport> {
        let start = Instant::now();

        if reader.headers().iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::ValidationError(
                "Uploaded file has no header row".to_string(),
            ));
        }

        let mut tally = ResultTally::new();
        let mut preview = PreviewBuffer::new(self.config.preview_limit);
        let mut chunk_count = 0;

        while let Some(chunk) = reader.next_chunk()? {
            let first_row = chunk.first_row;
            let labels = self.predict_chunk(chunk).map_err(|e| {
                warn!(chunk = chunk_count, first_row, error = %e, "Chunk prediction failed");
                e
            })?;

            writer.append(&labels)?;
            preview.extend_from(&labels);
            tally.record_all(&labels);
            chunk_count += 1;

            debug!(
                chunk = chunk_count,
                rows = labels.len(),
                rows_written = writer.rows_written(),
                "Chunk classified"
            );
        }

        if chunk_count == 0 {
            return Err(AppError::ValidationError(
                "Uploaded file has no data rows".to_string(),
            ));
        }

        let headline_attack = tally.headline(&self.config.baseline_label);
        let total_rows = tally.total();
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            total_rows,
            chunk_count,
            headline = %headline_attack,
            processing_time_ms,
            "Batch prediction finished"
        );

        Ok(ScanReport {
            headline_attack,
            summary: tally.into_entries(),
            preview: preview.into_rows(),
            total_rows,
            chunk_count,
            output_path: writer.path().to_path_buf(),
            processing_time_ms,
        })
    }

    /// Align, clean, classify and decode one chunk
    fn predict_chunk(&self, chunk: RawChunk) -> Result<Vec<String>> {
        let n_rows = chunk.len();
        let aligned = align(chunk, &self.context.schema);
        let features = self.cleaner.clean(aligned);

        let ids = self.context.classifier.predict(&features)?;
        if ids.len() != n_rows {
            return Err(AppError::ModelError(format!(
                "Classifier returned {} predictions for {} rows",
                ids.len(),
                n_rows
            )));
        }

        let labels = self.context.decoder.decode(&ids)?;
        if labels.len() != ids.len() {
            return Err(AppError::ModelError(format!(
                "Label decoder returned {} labels for {} ids",
                labels.len(),
                ids.len()
            )));
        }

        Ok(labels)
    }
}
