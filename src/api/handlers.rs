//! API request handlers
//!
//! Workbooks are uploaded as the raw request body; the reference date is a
//! `date=YYYY-MM-DD` query parameter (today when omitted).

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DEFAULT_OUTPUT_FILE;
use crate::core::dates::parse_reference_date;
use crate::core::{AgeingTransformer, RunOutcome, Slab};
use crate::error::AgeingError;
use crate::excel::{WorkbookExporter, WorkbookImporter};

use super::server::AppState;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const INVALID_ROWS_HEADER: &str = "x-invalid-date-rows";
pub const SCHEMA_ERROR_HEADER: &str = "x-schema-error";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(method: &str, path: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(RootResponse {
        name: "Ageing API Server".to_string(),
        version: state.version.clone(),
        description: "Disbursement ageing and slabs for Excel workbooks".to_string(),
        endpoints: vec![
            EndpointInfo::new("GET", "/health", "Health check endpoint"),
            EndpointInfo::new("GET", "/version", "Get server version"),
            EndpointInfo::new(
                "POST",
                "/api/v1/process",
                "Upload an .xlsx body, download the processed workbook",
            ),
            EndpointInfo::new(
                "POST",
                "/api/v1/report",
                "Upload an .xlsx body, get a JSON summary of the run",
            ),
        ],
    }))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec!["process".to_string(), "report".to_string()],
    }))
}

/// Query parameters shared by the upload endpoints
#[derive(Debug, Deserialize, Default)]
pub struct ProcessQuery {
    pub date: Option<String>,
}

/// JSON summary of one run
#[derive(Debug, Serialize, Default)]
pub struct ReportResponse {
    pub reference_date: String,
    pub sheets: Vec<String>,
    pub rows: usize,
    pub annotated: bool,
    pub invalid_date_rows: usize,
    /// Zero-based positions in the consolidated table
    pub invalid_row_indices: Vec<usize>,
    pub slab_counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_error: Option<String>,
    pub warnings: Vec<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

/// Parse the date, import the upload and run the pipeline.
fn run_upload(
    state: &AppState,
    query: &ProcessQuery,
    body: &[u8],
) -> Result<(AgeingTransformer, Vec<String>, RunOutcome), Response> {
    let reference_date = parse_reference_date(query.date.as_deref())
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    if body.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Request body must be an .xlsx workbook",
        ));
    }

    let sheets = WorkbookImporter::import_bytes(body).map_err(|e| {
        warn!("rejected upload: {}", e);
        error_response(StatusCode::BAD_REQUEST, e.to_string())
    })?;
    let sheet_names = sheets.sheet_names().iter().map(|s| s.to_string()).collect();

    let transformer = AgeingTransformer::with_config(state.config.clone(), reference_date);
    let outcome = transformer.run(sheets);
    Ok((transformer, sheet_names, outcome))
}

/// POST /api/v1/process - Process an uploaded workbook
///
/// Responds with the processed .xlsx. A missing date column is not an HTTP
/// error: the flattened sheets are returned with an `x-schema-error` header.
pub async fn process(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProcessQuery>,
    body: Bytes,
) -> Response {
    let (transformer, _, outcome) = match run_upload(&state, &query, &body) {
        Ok(run) => run,
        Err(response) => return response,
    };

    let bytes = match WorkbookExporter::new(&outcome.table, &transformer.config().output_sheet)
        .to_bytes()
    {
        Ok(bytes) => bytes,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME));
    if let Ok(value) =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", DEFAULT_OUTPUT_FILE))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert(
        HeaderName::from_static(INVALID_ROWS_HEADER),
        HeaderValue::from(outcome.invalid_date_rows()),
    );
    if let Some(err) = &outcome.schema_error {
        if let Ok(value) = HeaderValue::from_str(&err.to_string()) {
            headers.insert(HeaderName::from_static(SCHEMA_ERROR_HEADER), value);
        }
    }

    info!(
        rows = outcome.table.row_count(),
        bytes = bytes.len(),
        "served processed workbook"
    );
    (StatusCode::OK, headers, bytes).into_response()
}

/// POST /api/v1/report - Summarize a run without returning the workbook
pub async fn report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProcessQuery>,
    body: Bytes,
) -> Response {
    let (transformer, sheets, outcome) = match run_upload(&state, &query, &body) {
        Ok(run) => run,
        Err(response) => return response,
    };

    let slab_counts = if outcome.is_annotated() {
        let counts = transformer.slab_counts(&outcome.table);
        Slab::ALL
            .iter()
            .map(|s| (s.label().to_string(), counts.get(s).copied().unwrap_or(0)))
            .collect()
    } else {
        BTreeMap::new()
    };

    let response = ReportResponse {
        reference_date: transformer.reference_date().to_string(),
        sheets,
        rows: outcome.table.row_count(),
        annotated: outcome.is_annotated(),
        invalid_date_rows: outcome.invalid_date_rows(),
        invalid_row_indices: outcome
            .warnings
            .iter()
            .flat_map(|w| w.row_indices.iter().copied())
            .collect(),
        slab_counts,
        schema_error: outcome.schema_error.as_ref().map(AgeingError::to_string),
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
    };

    Json(ApiResponse::ok(response)).into_response()
}
