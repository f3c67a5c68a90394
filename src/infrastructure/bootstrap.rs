use std::sync::{Arc, Mutex};

use tracing::error;

use crate::application::BatchPredictor;
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::model::{load_model_context, ModelArtifactLayout};
use crate::infrastructure::storage::StoragePaths;
use crate::interfaces::http::{add_log, AppState, LogEntry};

/// Prepare storage, load the model artifacts and build the shared state
pub fn setup(config: &AppConfig, logs: &Arc<Mutex<Vec<LogEntry>>>) -> Result<AppState> {
    let storage = StoragePaths::from_settings(&config.storage);
    storage.ensure().map_err(|err| {
        error!(
            error = %err,
            upload_dir = %config.storage.upload_dir.display(),
            "Failed to create upload dir"
        );
        err
    })?;

    let layout = ModelArtifactLayout::new(&config.storage.model_dir);
    let context = load_model_context(&layout).map_err(|err| {
        error!(
            error = %err,
            model_dir = %layout.root().display(),
            "Failed to load model artifacts"
        );
        err
    })?;

    add_log(
        logs,
        "INFO",
        "Model",
        &format!(
            "Loaded model from {} ({} features, {} classes)",
            layout.root().display(),
            context.schema.len(),
            context.decoder.classes().len()
        ),
    );

    let predictor = BatchPredictor::new(context, config.pipeline.clone())?;

    if storage.prediction_available() {
        add_log(
            logs,
            "INFO",
            "Storage",
            &format!(
                "Predictions from a previous run at {}",
                storage.prediction_file().display()
            ),
        );
    }

    Ok(AppState::new(predictor, storage))
}
