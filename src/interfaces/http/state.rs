use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::application::BatchPredictor;
use crate::infrastructure::storage::StoragePaths;

use super::LogEntry;

/// Long-lived state shared by every request.
pub struct AppState {
    pub predictor: Arc<BatchPredictor>,
    pub storage: StoragePaths,
    /// Held for the whole of a scan; every scan writes the same prediction file
    pub scan_lock: AsyncMutex<()>,
}

impl AppState {
    pub fn new(predictor: BatchPredictor, storage: StoragePaths) -> Self {
        Self {
            predictor: Arc::new(predictor),
            storage,
            scan_lock: AsyncMutex::new(()),
        }
    }
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}
