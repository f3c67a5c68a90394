use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{start_server, LogEntry};

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| std::io::Error::other(e.to_string()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let state = bootstrap::setup(&config, &logs)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let server = start_server(Arc::new(state), logs, &config.server)?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Serving prediction API"
    );

    server.await
}
