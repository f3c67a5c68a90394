// ============================================================
// CSV CHUNK READER
// ============================================================
// Stream a delimited file as fixed-size row chunks with encoding fallback

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, Reader, ReaderBuilder};
use encoding_rs::WINDOWS_1252;

use crate::domain::detection::RawChunk;
use crate::domain::error::{AppError, Result};

/// Bytes inspected for delimiter detection
const DELIMITER_SAMPLE_BYTES: usize = 4096;

/// Reads a delimited file `chunk_size` rows at a time.
///
/// Only one chunk is held in memory; the header is read once up front.
pub struct ChunkReader<R: Read> {
    reader: Reader<R>,
    headers: Vec<String>,
    chunk_size: usize,
    rows_read: usize,
    record: ByteRecord,
}

impl ChunkReader<File> {
    /// Open a file, detecting its delimiter from the first few kilobytes
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let sample = {
            let mut file = File::open(path).map_err(|e| {
                AppError::IoError(format!("Failed to open {}: {}", path.display(), e))
            })?;
            let mut buffer = Vec::with_capacity(DELIMITER_SAMPLE_BYTES);
            file.by_ref()
                .take(DELIMITER_SAMPLE_BYTES as u64)
                .read_to_end(&mut buffer)
                .map_err(|e| {
                    AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
                })?;
            buffer
        };

        let delimiter = detect_delimiter(&sample);
        let file = File::open(path).map_err(|e| {
            AppError::IoError(format!("Failed to open {}: {}", path.display(), e))
        })?;

        Self::from_reader(file, delimiter, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    pub fn from_reader(input: R, delimiter: u8, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::ValidationError(
                "chunk_size must be > 0".to_string(),
            ));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true) // Allow rows with different lengths
            .has_headers(true)
            .from_reader(input);

        let headers = reader
            .byte_headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(decode_field)
            .collect();

        Ok(Self {
            reader,
            headers,
            chunk_size,
            rows_read: 0,
            record: ByteRecord::new(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows returned so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Read the next chunk, or `None` once the input is exhausted
    pub fn next_chunk(&mut self) -> Result<Option<RawChunk>> {
        let first_row = self.rows_read;
        let mut rows: Vec<Vec<String>> = Vec::with_capacity(self.chunk_size.min(8192));

        while rows.len() < self.chunk_size {
            let has_record = self.reader.read_byte_record(&mut self.record).map_err(|e| {
                AppError::ParseError(format!(
                    "Failed to parse CSV row {}: {}",
                    self.rows_read + rows.len() + 1,
                    e
                ))
            })?;
            if !has_record {
                break;
            }
            rows.push(self.record.iter().map(decode_field).collect());
        }

        if rows.is_empty() {
            return Ok(None);
        }

        self.rows_read += rows.len();
        Ok(Some(RawChunk {
            columns: self.headers.clone(),
            rows,
            first_row,
        }))
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<RawChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

/// Decode a field as UTF-8, falling back to Windows-1252
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Detect delimiter from content (comma, semicolon, tab, pipe)
fn detect_delimiter(sample: &[u8]) -> u8 {
    let candidates = [b',', b';', b'\t', b'|'];

    let sample_lines: Vec<&[u8]> = sample
        .split(|&b| b == b'\n')
        .filter(|line| !line.is_empty())
        .take(10)
        .collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best_delimiter = b',';
    let mut best_score = 0.0f32;

    for &delimiter in &candidates {
        let field_counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| line.iter().filter(|&&b| b == delimiter).count())
            .collect();

        // Score by consistency (low standard deviation) and frequency
        let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
        let variance = field_counts
            .iter()
            .map(|&x| (x as f32 - avg).powi(2))
            .sum::<f32>()
            / field_counts.len() as f32;

        let score = avg / (1.0 + variance.sqrt());

        if score > best_score {
            best_score = score;
            best_delimiter = delimiter;
        }
    }

    best_delimiter
}
