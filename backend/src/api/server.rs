//! HTTP Server for the comps API.
//!
//! Each request is an independent unit of work: the upload is transformed
//! on a blocking worker and the result goes straight back to the caller.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                               |
//! |--------|-------------------|-------------------------------------------|
//! | GET    | `/health`         | Health check                              |
//! | POST   | `/api/upload`     | Upload workbook, get the summary (JSON)   |
//! | POST   | `/api/transform`  | Upload workbook, get the formatted `.xlsx`|
//! | GET    | `/api/logs`       | SSE stream for progress and logs          |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, UploadFields, UploadResponse};
use crate::config::{ReportConfig, MAX_UPLOAD_SIZE};
use crate::error::{IngestError, PipelineError, ServerError, ServerResult};
use crate::transform::pipeline::{process_bytes, ProcessedReport, TransformOptions};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared, read-only server state
#[derive(Clone)]
struct AppState {
    config: Arc<ReportConfig>,
}

/// An uploaded workbook plus its form fields
struct Upload {
    bytes: Vec<u8>,
    file_name: Option<String>,
    fields: UploadFields,
}

/// Build the router with `config` as the per-request starting point.
pub fn router(config: ReportConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_workbook))
        .route("/api/transform", post(transform_workbook))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(
    port: u16,
    config: ReportConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Comps server running on http://localhost:{}", port);
    println!("   POST /api/upload    - Upload workbook, get summary");
    println!("   POST /api/transform - Upload workbook, get formatted xlsx");
    println!("   GET  /api/logs      - SSE progress stream");
    println!("   GET  /health        - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "comps",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "transform": "POST /api/transform",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time progress streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: summary for display
async fn upload_workbook(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let upload = read_upload(multipart).await?;
    let report = run_pipeline(&state, upload).await?;

    println!(
        "📊 {} records, {} ({})",
        report.output.summary.record_count,
        report.output.summary.price_range,
        report.output.summary.quartile_sizes
    );

    Ok(Json(UploadResponse::from(report)))
}

/// Transform endpoint: formatted workbook for download
async fn transform_workbook(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let upload = read_upload(multipart).await?;
    let report = run_pipeline(&state, upload).await?;

    let disposition = format!("attachment; filename=\"{}\"", report.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.xlsx,
    )
        .into_response())
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    let mut bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut fields = UploadFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                bytes = Some(data.to_vec());
            }
            "subdivision" | "sheet" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                if name == "subdivision" {
                    fields.subdivision = Some(text);
                } else {
                    fields.sheet = Some(text);
                }
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    Ok(Upload { bytes, file_name, fields })
}

async fn run_pipeline(state: &AppState, upload: Upload) -> ServerResult<ProcessedReport> {
    let options = TransformOptions::new(request_config(&state.config, &upload.fields));

    println!(
        "📄 New upload: {} ({} bytes)",
        upload.file_name.as_deref().unwrap_or("unknown"),
        upload.bytes.len()
    );

    let result = tokio::task::spawn_blocking(move || {
        process_bytes(
            &upload.bytes,
            upload.file_name.as_deref(),
            &options,
            &*LOG_BROADCASTER,
        )
    })
    .await
    .map_err(|e| ServerError::Internal(format!("transform task failed: {}", e)))?;

    result.map_err(|e| {
        log_error(e.to_string());
        ServerError::from(e)
    })
}

/// Server config with the request's form fields applied.
fn request_config(base: &ReportConfig, fields: &UploadFields) -> ReportConfig {
    fn present(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    let mut config = base.clone();
    if let Some(subdivision) = present(&fields.subdivision) {
        config.subdivision = Some(subdivision.to_string());
    }
    if let Some(sheet) = present(&fields.sheet) {
        config.input_sheet = sheet.to_string();
    }
    config
}

fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::Pipeline(PipelineError::Ingest(ingest)) => match ingest {
            IngestError::InvalidFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            IngestError::SheetNotFound { .. } | IngestError::EmptySheet(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            IngestError::ReadFailure(_) => StatusCode::BAD_REQUEST,
        },
        ServerError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}
