use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::detection::PipelineConfig;
use crate::domain::error::{AppError, Result};

/// Optional config file looked up from the working directory
pub const CONFIG_FILE: &str = "threatlens.toml";

/// Prefix of environment overrides, nested keys joined with `__`
pub const ENV_PREFIX: &str = "THREATLENS_";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerSettings {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// Largest accepted upload body in bytes
    #[validate(range(min = 1))]
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: 512 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding features.json, model.json and label_encoder.json
    pub model_dir: PathBuf,

    /// Where uploads and the prediction file are stored
    pub upload_dir: PathBuf,

    /// File name of the prediction output inside `upload_dir`
    #[validate(length(min = 1))]
    pub prediction_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("analysis").join("model"),
            upload_dir: PathBuf::from("uploads"),
            prediction_file: "predictions.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub pipeline: PipelineConfig,

    /// Fallback `tracing` filter when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            pipeline: PipelineConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `threatlens.toml`, then `THREATLENS_*` variables
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let mut config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;

        if config.log_filter.trim().is_empty() {
            config.log_filter = "info".to_string();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.server
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid server settings: {}", e)))?;
        self.storage
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid storage settings: {}", e)))?;
        if self.storage.prediction_file.contains(['/', '\\']) {
            return Err(AppError::ConfigError(
                "prediction_file must be a file name, not a path".to_string(),
            ));
        }
        self.pipeline
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid pipeline config: {}", e)))?;
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
