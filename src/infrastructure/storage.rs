use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::StorageSettings;

static UNSAFE_FILE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

const DEFAULT_UPLOAD_NAME: &str = "upload.csv";

/// On-disk locations for uploads and the single prediction file.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    upload_dir: PathBuf,
    prediction_file: PathBuf,
}

impl StoragePaths {
    pub fn new(upload_dir: &Path, prediction_file_name: &str) -> Self {
        Self {
            upload_dir: upload_dir.to_path_buf(),
            prediction_file: upload_dir.join(prediction_file_name),
        }
    }

    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(&settings.upload_dir, &settings.prediction_file)
    }

    pub fn ensure(&self) -> Result<()> {
        ensure_dir(&self.upload_dir)
    }

    pub fn prediction_file(&self) -> &Path {
        &self.prediction_file
    }

    /// Whether a completed (or partially written) prediction file exists
    pub fn prediction_available(&self) -> bool {
        self.prediction_file.is_file()
    }

    /// Unique destination for an uploaded file
    pub fn upload_path(&self, original_name: Option<&str>) -> PathBuf {
        let name = sanitize_file_name(original_name.unwrap_or(DEFAULT_UPLOAD_NAME));
        self.upload_dir.join(format!("{}_{}", Uuid::new_v4(), name))
    }
}

/// Reduce an uploaded name to a safe single path component
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned = UNSAFE_FILE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        DEFAULT_UPLOAD_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        AppError::IoError(format!("Failed to create dir {}: {}", path.display(), e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories_and_symbols() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\data\\Friday traffic.csv"), "Friday_traffic.csv");
        assert_eq!(sanitize_file_name("..."), "upload.csv");
        assert_eq!(sanitize_file_name(""), "upload.csv");
    }

    #[test]
    fn test_upload_paths_are_unique_and_inside_dir() {
        let paths = StoragePaths::new(Path::new("/srv/uploads"), "predictions.csv");
        let a = paths.upload_path(Some("flows.csv"));
        let b = paths.upload_path(Some("flows.csv"));

        assert_ne!(a, b);
        assert!(a.starts_with("/srv/uploads"));
        assert!(a.to_string_lossy().ends_with("_flows.csv"));
        assert_eq!(paths.prediction_file(), Path::new("/srv/uploads/predictions.csv"));
    }

    #[test]
    fn test_ensure_creates_upload_dir() {
        let dir = std::env::temp_dir()
            .join(format!("storage_{}", Uuid::new_v4()))
            .join("uploads");
        let paths = StoragePaths::new(&dir, "predictions.csv");

        paths.ensure().unwrap();
        assert!(dir.is_dir());
        assert!(!paths.prediction_available());

        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }
}
