mod state;

pub use state::{AppState, HttpState};

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::domain::detection::ScanReport;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::ServerSettings;

/// Entries kept in the in-memory activity log
pub const LOG_CAPACITY: usize = 100;

/// Name offered to the browser for the prediction download
pub const DOWNLOAD_FILE_NAME: &str = "cyber_threat_predictions.csv";

const NO_FILE_MESSAGE: &str = "Please upload a CSV file.";
const NO_PREDICTIONS_MESSAGE: &str = "Prediction file not found. Please upload and predict first.";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: String,
    pub report: ScanReport,
    pub download_ready: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub feature_count: usize,
    pub classes: Vec<String>,
    pub chunk_size: usize,
    pub prediction_available: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_body(message: impl Into<String>) -> ErrorResponse {
    ErrorResponse {
        error: message.into(),
    }
}

fn error_response(err: &AppError) -> HttpResponse {
    match err {
        AppError::ValidationError(_) | AppError::ParseError(_) => {
            HttpResponse::UnprocessableEntity().json(error_body(err.to_string()))
        }
        AppError::NotFound(_) => HttpResponse::NotFound().json(error_body(err.to_string())),
        _ => HttpResponse::InternalServerError().json(error_body(err.to_string())),
    }
}

#[get("/health")]
async fn health(data: web::Data<HttpState>) -> impl Responder {
    let predictor = &data.app_state.predictor;
    let context = predictor.context();

    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        feature_count: context.schema.len(),
        classes: context.decoder.classes().to_vec(),
        chunk_size: predictor.config().chunk_size,
        prediction_available: data.app_state.storage.prediction_available(),
    })
}

#[post("/upload")]
async fn upload(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    mut payload: web::Payload,
) -> impl Responder {
    let storage = &data.app_state.storage;
    let upload_path = storage.upload_path(query.filename.as_deref());

    let received = match save_upload(&mut payload, &upload_path, data.max_upload_bytes).await {
        Ok(received) => received,
        Err(e) => {
            discard_upload(&data.logs, &upload_path).await;
            add_log(
                &data.logs,
                "ERROR",
                "Upload",
                &format!("Failed to save upload {}: {}", upload_path.display(), e),
            );
            return match e {
                AppError::ValidationError(_) => {
                    HttpResponse::PayloadTooLarge().json(error_body(e.to_string()))
                }
                _ => HttpResponse::InternalServerError()
                    .json(error_body(format!("Failed to save uploaded file: {}", e))),
            };
        }
    };

    if received == 0 {
        discard_upload(&data.logs, &upload_path).await;
        add_log(&data.logs, "WARN", "Upload", "Rejected upload with an empty body");
        return HttpResponse::BadRequest().json(error_body(NO_FILE_MESSAGE));
    }

    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!("Saved {} bytes to {}", received, upload_path.display()),
    );

    let _guard = data.app_state.scan_lock.lock().await;

    let predictor = Arc::clone(&data.app_state.predictor);
    let input = upload_path.clone();
    let output = storage.prediction_file().to_path_buf();
    let result = web::block(move || predictor.run(&input, &output)).await;

    // Only the prediction file outlives a request
    discard_upload(&data.logs, &upload_path).await;

    match result {
        Ok(Ok(report)) => {
            add_log(
                &data.logs,
                "INFO",
                "Predict",
                &format!(
                    "Classified {} rows in {} chunks, headline {}",
                    report.total_rows, report.chunk_count, report.headline_attack
                ),
            );
            HttpResponse::Ok().json(UploadResponse {
                success: "Prediction completed successfully".to_string(),
                report,
                download_ready: true,
            })
        }
        Ok(Err(e)) => {
            add_log(
                &data.logs,
                "ERROR",
                "Predict",
                &format!("Prediction failed for {}: {}", upload_path.display(), e),
            );
            error_response(&e)
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Predict",
                &format!("Prediction worker failed: {}", e),
            );
            HttpResponse::InternalServerError().json(error_body(e.to_string()))
        }
    }
}

/// Stream the request body to `path`, failing once it grows past `limit` bytes
async fn save_upload(payload: &mut web::Payload, path: &Path, limit: usize) -> Result<usize> {
    let mut file = tokio::fs::File::create(path).await.map_err(|e| {
        AppError::IoError(format!("Failed to create {}: {}", path.display(), e))
    })?;

    let mut received = 0;
    while let Some(chunk) = payload.next().await {
        let chunk = chunk
            .map_err(|e| AppError::IoError(format!("Failed to read upload body: {}", e)))?;
        received += chunk.len();
        if received > limit {
            return Err(AppError::ValidationError(format!(
                "Upload exceeds the {} byte limit",
                limit
            )));
        }
        file.write_all(&chunk).await.map_err(|e| {
            AppError::IoError(format!("Failed to write {}: {}", path.display(), e))
        })?;
    }

    file.flush().await.map_err(|e| {
        AppError::IoError(format!("Failed to flush {}: {}", path.display(), e))
    })?;
    Ok(received)
}

async fn discard_upload(logs: &Mutex<Vec<LogEntry>>, path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => add_log(
            logs,
            "WARN",
            "Upload",
            &format!("Failed to remove upload {}: {}", path.display(), e),
        ),
    }
}

#[get("/download")]
async fn download(data: web::Data<HttpState>) -> impl Responder {
    // Wait out a running scan so a half-written file is never served
    let _guard = data.app_state.scan_lock.lock().await;
    let path = data.app_state.storage.prediction_file();

    match tokio::fs::read(path).await {
        Ok(bytes) => {
            add_log(
                &data.logs,
                "INFO",
                "Download",
                &format!("Serving {} ({} bytes)", path.display(), bytes.len()),
            );
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
                ))
                .body(bytes)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            add_log(&data.logs, "WARN", "Download", NO_PREDICTIONS_MESSAGE);
            HttpResponse::NotFound().json(error_body(NO_PREDICTIONS_MESSAGE))
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Download",
                &format!("Failed to read {}: {}", path.display(), e),
            );
            HttpResponse::InternalServerError()
                .json(error_body(format!("Failed to read prediction file: {}", e)))
        }
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    match level {
        "ERROR" => error!(source, "{}", message),
        "WARN" => warn!(source, "{}", message),
        "DEBUG" => debug!(source, "{}", message),
        _ => info!(source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry.clone());
    if logs.len() > LOG_CAPACITY {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Registers every route under `/api`
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health)
            .service(upload)
            .service(download)
            .service(get_logs),
    );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    settings: &ServerSettings,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState {
        app_state,
        logs,
        max_upload_bytes: settings.max_upload_bytes,
    });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure_api)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::BatchPredictor;
    use crate::domain::detection::{FeatureSchema, PipelineConfig};
    use crate::domain::model::ModelContext;
    use crate::infrastructure::model::{DecisionTree, ForestClassifier, LabelEncoder};
    use crate::infrastructure::storage::StoragePaths;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use std::path::PathBuf;
    use uuid::Uuid;

    struct Fixture {
        dir: PathBuf,
        state: web::Data<HttpState>,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    const CSV: &str = "Total Fwd Packets,Flow Duration,Label\n3,1,x\n4,50,x\n5,70,x\n";

    fn fixture() -> Fixture {
        fixture_with_limit(1024 * 1024)
    }

    /// Stump on `Flow Duration`: above 10 is DoS, otherwise BENIGN
    fn fixture_with_limit(max_upload_bytes: usize) -> Fixture {
        let dir = std::env::temp_dir().join(format!("http_{}", Uuid::new_v4()));
        let schema = FeatureSchema::new(vec![
            "Flow Duration".to_string(),
            "Total Fwd Packets".to_string(),
        ])
        .unwrap();
        let stump = DecisionTree::stump(0, 10.0, 0, 1);
        let classifier = ForestClassifier::new(2, 2, vec![stump]).unwrap();
        let decoder = LabelEncoder::new(vec!["BENIGN".to_string(), "DoS".to_string()]).unwrap();
        let context = ModelContext::new(schema, Arc::new(classifier), Arc::new(decoder)).unwrap();
        let predictor = BatchPredictor::new(context, PipelineConfig::new().with_chunk_size(2)).unwrap();

        let storage = StoragePaths::new(&dir, "predictions.csv");
        storage.ensure().unwrap();

        let state = web::Data::new(HttpState {
            app_state: Arc::new(AppState::new(predictor, storage)),
            logs: Arc::new(Mutex::new(Vec::new())),
            max_upload_bytes,
        });
        Fixture { dir, state }
    }

    macro_rules! init_app {
        ($fixture:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data($fixture.state.clone())
                    .configure(configure_api),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health_reports_model() {
        let fixture = fixture();
        let app = init_app!(fixture);

        let req = actix_test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["feature_count"], 2);
        assert_eq!(body["classes"], serde_json::json!(["BENIGN", "DoS"]));
        assert_eq!(body["chunk_size"], 2);
        assert_eq!(body["prediction_available"], false);
    }

    #[actix_web::test]
    async fn test_empty_upload_is_rejected() {
        let fixture = fixture();
        let app = init_app!(fixture);

        let req = actix_test::TestRequest::post().uri("/api/upload").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], NO_FILE_MESSAGE);
    }

    #[actix_web::test]
    async fn test_download_before_any_scan() {
        let fixture = fixture();
        let app = init_app!(fixture);

        let req = actix_test::TestRequest::get().uri("/api/download").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], NO_PREDICTIONS_MESSAGE);
    }

    #[actix_web::test]
    async fn test_upload_then_download() {
        let fixture = fixture();
        let app = init_app!(fixture);

        let req = actix_test::TestRequest::post()
            .uri("/api/upload?filename=friday.csv")
            .set_payload(CSV)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["success"], "Prediction completed successfully");
        assert_eq!(body["download_ready"], true);
        assert_eq!(body["report"]["headline_attack"], "DoS");
        assert_eq!(body["report"]["total_rows"], 3);
        assert_eq!(body["report"]["chunk_count"], 2);
        assert_eq!(
            body["report"]["preview"],
            serde_json::json!(["BENIGN", "DoS", "DoS"])
        );

        let req = actix_test::TestRequest::get().uri("/api/download").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains(DOWNLOAD_FILE_NAME));

        let bytes = actix_test::read_body(resp).await;
        assert_eq!(&bytes[..], b"Attack Type\nBENIGN\nDoS\nDoS\n");
    }

    #[actix_web::test]
    async fn test_header_only_upload_is_unprocessable() {
        let fixture = fixture();
        let app = init_app!(fixture);

        let req = actix_test::TestRequest::post()
            .uri("/api/upload?filename=empty.csv")
            .set_payload("Flow Duration,Total Fwd Packets\n")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = actix_test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = actix_test::call_and_read_body_json(&app, req).await;
        assert!(logs.iter().any(|entry| entry.level == "ERROR" && entry.source == "Predict"));
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[actix_web::test]
    async fn test_uploads_are_not_retained() {
        let fixture = fixture();
        let app = init_app!(fixture);

        for payload in [CSV, "Flow Duration,Total Fwd Packets\n", CSV] {
            let req = actix_test::TestRequest::post()
                .uri("/api/upload?filename=x.csv")
                .set_payload(payload)
                .to_request();
            actix_test::call_service(&app, req).await;
        }

        assert_eq!(files_in(&fixture.dir), vec!["predictions.csv"]);
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_rejected() {
        let fixture = fixture_with_limit(16);
        let app = init_app!(fixture);

        let req = actix_test::TestRequest::post()
            .uri("/api/upload?filename=big.csv")
            .set_payload(CSV)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        assert!(files_in(&fixture.dir).is_empty());
    }

    #[test]
    fn test_log_ring_buffer_is_capped() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(LOG_CAPACITY + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }

        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), LOG_CAPACITY);
        assert_eq!(logs[0].message, "entry 5");
    }
}
