// ============================================================
// PREDICTION WRITER
// ============================================================
// Append-only output of predicted labels, one chunk at a time

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::domain::error::{AppError, Result};

/// Writes labels to a single-column CSV.
///
/// The first batch creates the file and writes the header; later batches are
/// appended without one. Each batch is flushed before `append` returns, so
/// completed batches stay on disk if a later one fails.
pub struct PredictionWriter {
    path: PathBuf,
    column: String,
    rows_written: usize,
    batches_written: usize,
}

impl PredictionWriter {
    /// Prepare a writer, deleting whatever a previous run left at `path`
    pub fn create(path: &Path, column: &str) -> Result<Self> {
        remove_stale_output(path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::IoError(format!("Failed to create dir {}: {}", parent.display(), e))
            })?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            column: column.to_string(),
            rows_written: 0,
            batches_written: 0,
        })
    }

    pub fn append(&mut self, labels: &[String]) -> Result<()> {
        let first_batch = self.batches_written == 0;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(first_batch)
            .append(!first_batch)
            .open(&self.path)
            .map_err(|e| {
                AppError::IoError(format!("Failed to open {}: {}", self.path.display(), e))
            })?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        let write_err = |e: csv::Error| {
            AppError::IoError(format!("Failed to write {}: {}", self.path.display(), e))
        };

        if first_batch {
            writer.write_record([self.column.as_str()]).map_err(write_err)?;
        }
        for label in labels {
            writer.write_record([label.as_str()]).map_err(write_err)?;
        }
        writer.flush().map_err(|e| {
            AppError::IoError(format!("Failed to flush {}: {}", self.path.display(), e))
        })?;

        self.rows_written += labels.len();
        self.batches_written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

/// Delete a previous prediction file; returns whether one existed
fn remove_stale_output(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::IoError(format!(
            "Failed to remove previous predictions {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("predictions_{}.csv", Uuid::new_v4()))
    }

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_header_written_once() {
        let path = temp_path();
        let mut writer = PredictionWriter::create(&path, "Attack Type").unwrap();
        writer.append(&labels(&["BENIGN", "DoS"])).unwrap();
        writer.append(&labels(&["PortScan"])).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Attack Type\nBENIGN\nDoS\nPortScan\n");
        assert_eq!(writer.rows_written(), 3);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_create_removes_previous_output() {
        let path = temp_path();
        fs::write(&path, "Attack Type\nstale\n").unwrap();

        let writer = PredictionWriter::create(&path, "Attack Type").unwrap();
        assert!(!path.exists());
        assert_eq!(writer.path(), path.as_path());
    }

    #[test]
    fn test_labels_with_delimiters_are_quoted() {
        let path = temp_path();
        let mut writer = PredictionWriter::create(&path, "Attack Type").unwrap();
        writer.append(&labels(&["Web Attack, XSS"])).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Attack Type\n\"Web Attack, XSS\"\n");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_remove_stale_output_missing_file() {
        assert!(!remove_stale_output(&temp_path()).unwrap());
    }
}
