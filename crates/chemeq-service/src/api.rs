//! REST API endpoints for the chemeq-service.
//!
//! # Lock Acquisition
//!
//! `state.store` is the only lock. Uploads are parsed and validated on a
//! blocking thread before it is taken, and reports and exports are rendered
//! after it is released, so the lock is held only for database work.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]:
//! `{"error": "...", "kind": "..."}` plus details where the kind has them.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info};

use chemeq_core::report::{self, ExportFormat};
use chemeq_core::{ExportError, IngestError};
use chemeq_store::{RecordQuery, UploadStore};
use chemeq_types::{EquipmentRecord, Upload, UploadSummary};

use crate::state::AppState;

/// Multipart field carrying the dataset.
pub const UPLOAD_FIELD: &str = "file";

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/upload", post(upload_dataset))
        .route("/api/history", get(get_history))
        .route("/api/summary", get(get_summary))
        .route("/api/uploads/{id}", get(get_upload))
        .route("/api/uploads/{id}/records", get(get_records))
        .route("/api/uploads/{id}/report", get(get_report))
        .route("/api/uploads/{id}/export", get(export_upload))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub uptime_secs: i64,
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let now = OffsetDateTime::now_utc();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now,
        uptime_secs: (now - state.started_at).whole_seconds(),
    })
}

/// Response to a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub upload: Upload,
}

/// Upload a CSV dataset as multipart field `file`.
///
/// Parsing, validation and aggregation run before the store lock is taken.
/// Returns 201 with the stored upload.
async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(sanitize_filename)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "upload.csv".to_string());
        let bytes = field.bytes().await?;
        file = Some((filename, bytes));
        break;
    }
    let (filename, bytes) = file.ok_or(AppError::MissingFile)?;

    let pipeline = state.pipeline;
    let prepared = tokio::task::spawn_blocking(move || pipeline.prepare(&bytes, &filename))
        .await
        .map_err(|e| AppError::Internal(format!("Ingest task failed: {}", e)))??;

    let upload = {
        let mut store = state.store.lock().await;
        pipeline.commit(&mut *store, prepared)?
    };

    info!("Upload {} stored via API", upload.id);
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: format!(
                "Uploaded {} with {} equipment records",
                upload.filename,
                upload.records.len()
            ),
            upload,
        }),
    ))
}

/// Keep only the final path component of a client-supplied file name.
fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Query parameters for history.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of uploads (capped at the retention bound).
    pub limit: Option<usize>,
}

/// Most recent uploads, newest first, with their records.
async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<Upload>>, AppError> {
    let store = state.store.lock().await;
    let retention = store.retention();
    let limit = params.limit.map_or(retention, |l| l.min(retention));
    Ok(Json(store.list_recent(limit)?))
}

/// Get one upload.
async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Upload>, AppError> {
    Ok(Json(find_upload(&state, &id).await?))
}

async fn find_upload(state: &AppState, id: &str) -> Result<Upload, AppError> {
    let store = state.store.lock().await;
    store
        .get(id)?
        .ok_or_else(|| AppError::NotFound(format!("Upload not found: {}", id)))
}

/// Query parameters for record listing.
#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    /// Only records of this equipment type.
    #[serde(rename = "type")]
    pub category: Option<String>,
    /// Maximum number of records to return.
    pub limit: Option<u32>,
    /// Number of records to skip.
    pub offset: Option<u32>,
}

/// Paginated response wrapper with metadata.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The data items.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Number of items returned.
    pub count: usize,
    /// Offset from the beginning.
    pub offset: u32,
    /// Maximum items requested (if specified).
    pub limit: Option<u32>,
    /// Whether there are more items available.
    pub has_more: bool,
}

/// Records of one upload in dataset order.
async fn get_records(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<PaginatedResponse<EquipmentRecord>>, AppError> {
    let mut query = RecordQuery::new(&id);
    if let Some(category) = &params.category {
        query = query.category(category);
    }
    // Request one extra item to determine if there are more
    if let Some(limit) = params.limit {
        query = query.limit(limit.saturating_add(1));
    }
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }

    let mut records = {
        let store = state.store.lock().await;
        store
            .query_records(&query)?
            .ok_or_else(|| AppError::NotFound(format!("Upload not found: {}", id)))?
    };

    let has_more = params.limit.is_some_and(|l| records.len() > l as usize);
    if has_more {
        records.pop();
    }

    Ok(Json(PaginatedResponse {
        pagination: PaginationMeta {
            count: records.len(),
            offset: params.offset.unwrap_or(0),
            limit: params.limit,
            has_more,
        },
        data: records,
    }))
}

/// Query parameters for the summary endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// Upload to summarize; the latest upload when omitted.
    pub upload_id: Option<String>,
}

/// Statistics of the given upload, or of the most recent one.
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<UploadSummary>, AppError> {
    let store = state.store.lock().await;
    let summary = match &params.upload_id {
        Some(id) => store
            .get_summary(id)?
            .ok_or_else(|| AppError::NotFound(format!("Upload not found: {}", id)))?,
        None => store
            .list_summaries(1)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("No uploads yet".to_string()))?,
    };
    Ok(Json(summary))
}

/// Plain-text report as a download.
async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let upload = find_upload(&state, &id).await?;
    let body = report::render_text_report(&upload);
    let filename = report::export_filename(&upload, "txt");
    Ok(attachment("text/plain; charset=utf-8", &filename, body.into_bytes()))
}

/// Query parameters for export.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// `csv` (default) or `json`.
    pub format: Option<String>,
}

/// Upload exported as CSV or JSON.
async fn export_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = match params.format.as_deref() {
        Some(f) => f.parse::<ExportFormat>()?,
        None => ExportFormat::default(),
    };
    let upload = find_upload(&state, &id).await?;
    let body = report::export(&upload, format)?;
    let filename = report::export_filename(&upload, format.extension());
    Ok(attachment(format.content_type(), &filename, body))
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    MissingFile,
    PayloadTooLarge(String),
    Ingest(IngestError),
    Export(ExportError),
    Store(chemeq_store::Error),
    Internal(String),
}

impl From<chemeq_store::Error> for AppError {
    fn from(e: chemeq_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Store(e) => AppError::Store(e),
            other => AppError::Ingest(other),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Export(e)
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::BadRequest(e.body_text())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            AppError::MissingFile => (
                StatusCode::BAD_REQUEST,
                "missing_file",
                format!("No file provided in multipart field '{}'", UPLOAD_FIELD),
                None,
            ),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "dataset_too_large", msg, None)
            }
            AppError::Ingest(e) => {
                let status = match &e {
                    _ if !e.is_client_error() => StatusCode::INTERNAL_SERVER_ERROR,
                    IngestError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    IngestError::DatasetTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.kind(), e.to_string(), ingest_details(&e))
            }
            AppError::Export(ExportError::UnknownFormat(format)) => (
                StatusCode::BAD_REQUEST,
                "unsupported_format",
                format!("Unknown export format '{}': expected csv or json", format),
                None,
            ),
            AppError::Export(e) => {
                error!("Export failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "export", e.to_string(), None)
            }
            AppError::Store(e) => {
                error!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "store", e.to_string(), None)
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg, None)
            }
        };

        let mut body = serde_json::json!({
            "error": message,
            "kind": kind,
        });
        if let (Some(serde_json::Value::Object(extra)), Some(obj)) = (details, body.as_object_mut())
        {
            obj.extend(extra);
        }

        (status, Json(body)).into_response()
    }
}

/// Structured fields that let a client point at the offending input.
fn ingest_details(e: &IngestError) -> Option<serde_json::Value> {
    match e {
        IngestError::Schema(e) => Some(serde_json::json!({
            "missing_fields": e.missing_names(),
        })),
        IngestError::RowParse(e) => Some(serde_json::json!({
            "row_index": e.row_index,
            "field": e.field,
            "raw_value": e.raw_value,
        })),
        IngestError::DatasetTooLarge {
            limit,
            actual,
            unit,
        } => Some(serde_json::json!({
            "limit": limit,
            "actual": actual,
            "unit": unit.to_string(),
        })),
        _ => None,
    }
}
