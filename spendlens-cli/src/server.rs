//! HTTP front end: upload a statement, get the summary back, download it as a spreadsheet.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::{json, Value};
use spendlens_core::CategorizedSummary;
use spendlens_finance::{
    report_filename, CompletionClient, PipelineError, ReportWriter, StatementPipeline,
    XlsxReportWriter,
};
use spendlens_ingest::{PdfTextSource, TextSource};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::health::HealthReport;

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub struct AppState {
    config: Config,
    source: Arc<dyn TextSource>,
    /// Replaces the Anthropic client built from the environment
    client: Option<Arc<dyn CompletionClient>>,
    writer: Arc<dyn ReportWriter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source: Arc::new(PdfTextSource),
            client: None,
            writer: Arc::new(XlsxReportWriter),
        }
    }

    #[cfg(test)]
    pub fn with_source(mut self, source: Arc<dyn TextSource>) -> Self {
        self.source = source;
        self
    }

    #[cfg(test)]
    pub fn with_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Built per request so a credential set after startup is picked up, and a
    /// missing one fails the request instead of the server.
    fn pipeline(&self) -> Result<StatementPipeline, PipelineError> {
        let settings = self.config.pipeline_settings();
        match &self.client {
            Some(client) => Ok(StatementPipeline::standard(
                Arc::clone(&self.source),
                Arc::clone(client),
                &settings,
            )),
            None => StatementPipeline::from_env(
                Arc::clone(&self.source),
                &self.config.llm_config(),
                &settings,
            ),
        }
    }
}

/// JSON error body with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "error": message.into() }),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": message.into() }),
        }
    }

    fn processing(err: &anyhow::Error, debug: bool) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({
                "error": format!("Error processing file: {err}"),
                "details": debug.then(|| format!("{err:#}")),
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/favicon.ico", get(favicon))
        .route("/test", get(smoke_test))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/export", post(export))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    info!("Listening on http://{}", listener.local_addr()?);
    if !state.config.api_key_set() {
        warn!(
            "{} is not set; uploads will fail until it is",
            state.config.llm.api_key_env
        );
    }
    axum::serve(listener, router(Arc::new(state)))
        .await
        .context("server stopped")?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn smoke_test() -> Json<Value> {
    Json(json!({ "message": "spendlens is working!", "status": "ok" }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let mut report = HealthReport::check(&state.config);
    report.api_key_set |= state.client.is_some();
    Json(report)
}

/// POST /upload - categorize one statement
///
/// Multipart form with a `file` field holding the PDF.
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<CategorizedSummary>, ApiError> {
    let mut received: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError {
        status: e.status(),
        body: json!({ "error": format!("Failed to read upload: {}", e.body_text()) }),
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| ApiError {
            status: e.status(),
            body: json!({ "error": format!("Failed to read file data: {}", e.body_text()) }),
        })?;
        received = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = received.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request("Please upload a PDF file"));
    }

    info!("Upload {} ({} bytes)", filename, bytes.len());
    match process_upload(&state, &bytes).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            error!("Upload {} failed: {:#}", filename, e);
            Err(ApiError::processing(&e, state.config.server.debug))
        }
    }
}

async fn process_upload(state: &AppState, bytes: &[u8]) -> Result<CategorizedSummary> {
    let pipeline = state.pipeline()?;

    let dir = &state.config.server.upload_dir;
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    // removed when dropped, on every exit path
    let mut staged = tempfile::Builder::new()
        .prefix("statement-")
        .suffix(".pdf")
        .tempfile_in(dir)
        .with_context(|| format!("stage upload in {}", dir.display()))?;
    staged.write_all(bytes).context("write upload")?;
    staged.flush().context("write upload")?;

    Ok(pipeline.process_file(staged.path()).await?)
}

/// POST /export - render a summary (as returned by /upload) to a spreadsheet
async fn export(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let value: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    if value.get("categories").is_none() {
        return Err(ApiError::bad_request("No data to export"));
    }
    let summary: CategorizedSummary = serde_json::from_value(value)
        .map_err(|e| ApiError::bad_request(format!("Invalid export data: {e}")))?;

    let bytes = state.writer.render(&summary).map_err(|e| {
        error!("Export failed: {}", e);
        ApiError::internal(format!("Error exporting to Excel: {e}"))
    })?;
    let filename = report_filename(&Local::now(), state.writer.file_extension());
    info!(
        "Exported {} categories as {}",
        summary.categories.len(),
        filename
    );

    Ok((
        [
            (header::CONTENT_TYPE, state.writer.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use spendlens_finance::{CompletionParams, LlmError};
    use spendlens_ingest::PlainTextSource;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const STATEMENT: &str = "08-Oct-24 NFC - (AP-PAY)-DUBAI MALL AED 150.00\n09-Oct-24 CARREFOUR 45.50\n10-Oct-24 REFUND AED 20.00 CR\n";
    const BOUNDARY: &str = "spendlens-test-boundary";

    /// Remote model that is never reachable
    struct Offline;

    #[async_trait]
    impl CompletionClient for Offline {
        async fn complete(&self, _prompt: &str, _params: &CompletionParams) -> Result<String, LlmError> {
            Err(LlmError::Transport("offline".to_string()))
        }
    }

    fn test_config(uploads: &TempDir) -> Config {
        let mut cfg = Config::default();
        cfg.server.upload_dir = uploads.path().to_path_buf();
        cfg.llm.api_key_env = "SPENDLENS_SERVER_TEST_UNSET_KEY".to_string();
        cfg
    }

    fn app(cfg: Config) -> Router {
        let state = AppState::new(cfg)
            .with_source(Arc::new(PlainTextSource))
            .with_client(Arc::new(Offline));
        router(Arc::new(state))
    }

    fn multipart(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_smoke_routes() {
        let dir = tempfile::tempdir().unwrap();

        let resp = app(test_config(&dir)).oneshot(get_req("/test")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");

        let resp = app(test_config(&dir)).oneshot(get_req("/favicon.ico")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app(test_config(&dir)).oneshot(get_req("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&html).contains("/upload"));
    }

    #[tokio::test]
    async fn test_health_reports_capabilities() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(test_config(&dir)).oneshot(get_req("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["pdf_text"], true);
        assert_eq!(body["xlsx_export"], true);
        assert_eq!(body["api_key_set"], true);
        assert_eq!(body["upload_dir"], dir.path().display().to_string());
    }

    #[tokio::test]
    async fn test_upload_categorizes_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(test_config(&dir))
            .oneshot(multipart("file", "October.PDF", STATEMENT.as_bytes()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let raw = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(body["total_transactions"], 2);
        assert_eq!(body["total_expenses"], 195.5);
        // categories arrive largest total first
        let raw = String::from_utf8_lossy(&raw);
        let shopping = raw.find("\"Shopping\"").unwrap();
        let food = raw.find("\"Food & Dining\"").unwrap();
        assert!(shopping < food);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let dir = tempfile::tempdir().unwrap();

        let resp = app(test_config(&dir))
            .oneshot(multipart("attachment", "a.pdf", b"x"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "No file provided");

        let resp = app(test_config(&dir))
            .oneshot(multipart("file", "", b"x"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "No file selected");

        let resp = app(test_config(&dir))
            .oneshot(multipart("file", "statement.csv", b"x"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "Please upload a PDF file");
    }

    #[tokio::test]
    async fn test_upload_without_credential_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(&dir);
        let state = AppState::new(cfg.clone()).with_source(Arc::new(PlainTextSource));
        let resp = router(Arc::new(state))
            .oneshot(multipart("file", "s.pdf", STATEMENT.as_bytes()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        let msg = body["error"].as_str().unwrap();
        assert!(msg.starts_with("Error processing file:"));
        assert!(msg.contains("SPENDLENS_SERVER_TEST_UNSET_KEY"));
        assert!(body["details"].is_null());

        cfg.server.debug = true;
        let state = AppState::new(cfg).with_source(Arc::new(PlainTextSource));
        let resp = router(Arc::new(state))
            .oneshot(multipart("file", "s.pdf", STATEMENT.as_bytes()))
            .await
            .unwrap();
        assert!(json_body(resp).await["details"].is_string());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_upload_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(test_config(&dir)).with_client(Arc::new(Offline));
        let resp = router(Arc::new(state))
            .oneshot(multipart("file", "broken.pdf", b"%PDF-garbage"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_export_requires_categories() {
        let dir = tempfile::tempdir().unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/export")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"total_expenses": 10}"#))
            .unwrap();
        let resp = app(test_config(&dir)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "No data to export");
    }

    #[tokio::test]
    async fn test_export_returns_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let summary = json!({
            "categories": {
                "Shopping": {"total": 150.0, "transactions": [
                    {"date": "08-Oct-24", "description": "DUBAI MALL", "amount": 150.0}
                ]}
            },
            "total_expenses": 150.0,
            "total_transactions": 1
        });
        let req = Request::builder()
            .method("POST")
            .uri("/export")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(summary.to_string()))
            .unwrap();
        let resp = app(test_config(&dir)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let headers = resp.headers();
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"expense_report_"));
        assert!(disposition.ends_with(".xlsx\""));

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_export_rejects_unknown_category() {
        let dir = tempfile::tempdir().unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/export")
            .body(Body::from(r#"{"categories": {"Pets": {"total": 1.0, "transactions": []}}}"#))
            .unwrap();
        let resp = app(test_config(&dir)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
