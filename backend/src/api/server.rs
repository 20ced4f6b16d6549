//! HTTP server for the sweeper API.
//!
//! Stateless: every request carries its own CSV upload and gets its own
//! result. Nothing from one request is kept for the next.
//!
//! # API Endpoints
//!
//! | Method | Path                         | Description                          |
//! |--------|------------------------------|--------------------------------------|
//! | GET    | `/health`                    | Health check                         |
//! | POST   | `/api/process`               | Upload CSV, get categorized tickets  |
//! | POST   | `/api/export?target=<name>`  | Upload CSV, get one redacted CSV     |
//! | GET    | `/api/logs`                  | SSE stream for real-time logs        |
//!
//! `target` is a category (`general`, `volunteer`, `guest`, `speaker`),
//! `merged`, or one of the download file names.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ProcessResponse};
use crate::config::ServerConfig;
use crate::error::{ExportError, PipelineError, ServerError, ServerResult};
use crate::export::{render_target, ExportFile, ExportTarget};
use crate::parser::ParseOptions;
use crate::transform::pipeline::{process_upload, ProcessOutput};
use crate::validation::{UploadInfo, MISSING_FILE_MESSAGE};

/// Multipart field that carries the CSV file.
const FILE_FIELD: &str = "file";

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr();
    let app = router(&config);

    println!("🚀 Sweeper server running on http://{}", addr);
    println!("   POST /api/process            - Upload CSV, get categorized tickets");
    println!("   POST /api/export?target=...  - Upload CSV, download one redacted file");
    println!("   GET  /api/logs               - SSE log stream");
    println!("   GET  /health                 - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router.
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/process", post(process_csv))
        .route("/api/export", post(export_csv))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
}

/// A file received over multipart.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    fn info(&self) -> UploadInfo<'_> {
        UploadInfo {
            file_name: self.file_name.as_deref(),
            content_type: self.content_type.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub target: String,
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(PipelineError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Parse(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(PipelineError::Processing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Export(ExportError::UnknownTarget(_)) => StatusCode::BAD_REQUEST,
            ServerError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log_error(self.to_string());
        }
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sweeper",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "process": "POST /api/process",
            "export": "POST /api/export?target=<category|merged>",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // Lagged receivers skip what they missed
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Process endpoint: CSV upload in, categorized tickets out.
async fn process_csv(multipart: Multipart) -> ServerResult<Json<ProcessResponse>> {
    let upload = read_upload(multipart).await?;
    run_process(upload).await.map(Json)
}

/// Export endpoint: CSV upload in, one redacted CSV file out.
async fn export_csv(Query(query): Query<ExportQuery>, multipart: Multipart) -> ServerResult<Response> {
    let target: ExportTarget = query.target.parse()?;
    let upload = read_upload(multipart).await?;
    let file = run_export(upload, target).await?;

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.contents,
    )
        .into_response())
}

/// Pull the `file` field out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
            .to_vec();

        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(PipelineError::InvalidInput(MISSING_FILE_MESSAGE.to_string()).into())
}

/// Run the pipeline for an upload off the async runtime.
async fn run_pipeline(upload: Upload) -> ServerResult<(Upload, ProcessOutput)> {
    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        upload.file_name.as_deref().unwrap_or("unknown"),
        upload.bytes.len()
    ));

    let handle = tokio::task::spawn_blocking(move || {
        let output = process_upload(&upload.bytes, &upload.info(), &ParseOptions::default());
        (upload, output)
    });
    let (upload, output) = handle
        .await
        .map_err(|e| ServerError::Internal(format!("worker failed: {}", e)))?;

    Ok((upload, output?))
}

pub async fn run_process(upload: Upload) -> ServerResult<ProcessResponse> {
    let (upload, output) = run_pipeline(upload).await?;
    Ok(ProcessResponse::new(output, upload.file_name))
}

pub async fn run_export(upload: Upload, target: ExportTarget) -> ServerResult<ExportFile> {
    let (_, output) = run_pipeline(upload).await?;
    render_target(&output.result, target)?
        .ok_or_else(|| ServerError::NotFound(format!("no {} records to export", target)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Order ID,Billing Name,Email,Lineitem quantity,Discount Code,Financial Status\n\
                       1001,Jane Doe,j@x.com,2,VOL2024,paid\n\
                       1002,John Roe,r@x.com,1,,Refunded";

    fn csv_upload() -> Upload {
        Upload {
            file_name: Some("orders.csv".into()),
            content_type: Some("text/csv".into()),
            bytes: CSV.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_run_process() {
        let response = run_process(csv_upload()).await.unwrap();
        assert_eq!(response.summary.total_tickets, 3);
        assert_eq!(response.status, "warning");
        assert_eq!(response.file_name.as_deref(), Some("orders.csv"));
    }

    #[tokio::test]
    async fn test_run_export_volunteer() {
        let file = run_export(csv_upload(), "volunteer".parse().unwrap()).await.unwrap();
        assert_eq!(file.file_name, "volunteer_attendees.csv");
        assert_eq!(file.rows, 2);
        assert!(!file.contents.contains("VOL2024"));
    }

    #[tokio::test]
    async fn test_run_export_merged_marks_refunds() {
        let file = run_export(csv_upload(), ExportTarget::Merged).await.unwrap();
        assert_eq!(file.rows, 3);
        assert!(file.contents.contains("REFUNDED,General"));
    }

    #[tokio::test]
    async fn test_empty_category_is_not_found() {
        let err = run_export(csv_upload(), "speaker".parse().unwrap()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_file_type_is_bad_request() {
        let upload = Upload {
            file_name: Some("orders.xlsx".into()),
            content_type: Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".into()),
            bytes: CSV.as_bytes().to_vec(),
        };
        let err = run_process(upload).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Please upload a valid CSV file");
    }

    #[tokio::test]
    async fn test_empty_file_is_unprocessable() {
        let upload = Upload {
            bytes: Vec::new(),
            ..csv_upload()
        };
        let err = run_process(upload).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().starts_with("Error parsing CSV"));
    }

    #[tokio::test]
    async fn test_oversized_quantity_keeps_server_alive() {
        let upload = Upload {
            bytes: b"Billing Name,Lineitem quantity\nX,100000000000\n".to_vec(),
            ..csv_upload()
        };
        let err = run_process(upload).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        // The next request on the same runtime still succeeds
        assert!(run_process(csv_upload()).await.is_ok());
    }

    #[test]
    fn test_unknown_target_is_bad_request() {
        let err: ServerError = "vip".parse::<ExportTarget>().unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
