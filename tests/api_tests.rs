//! API integration tests

use std::sync::Arc;

use ageing_slab::api::build_router;
use ageing_slab::api::handlers::{
    ApiResponse, HealthResponse, ProcessQuery, ReportResponse, INVALID_ROWS_HEADER,
    SCHEMA_ERROR_HEADER, XLSX_MIME,
};
use ageing_slab::api::server::{ApiConfig, AppState};
use ageing_slab::config::AgeingConfig;
use ageing_slab::excel::WorkbookImporter;
use ageing_slab::types::CellValue;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rust_xlsxwriter::Workbook;
use tower::ServiceExt;

fn app() -> Router {
    build_router(Arc::new(AppState::new(AgeingConfig::default())))
}

/// Two sheets; the second has an unparseable date.
fn upload_bytes(with_date_column: bool) -> Vec<u8> {
    let date_header = if with_date_column {
        "Date of Disbursement"
    } else {
        "Booked"
    };
    let mut workbook = Workbook::new();

    let a = workbook.add_worksheet();
    a.set_name("Sheet A").unwrap();
    a.write_string(0, 0, date_header).unwrap();
    a.write_string(1, 0, "2022-01-01").unwrap();

    let b = workbook.add_worksheet();
    b.set_name("Sheet B").unwrap();
    b.write_string(0, 0, date_header).unwrap();
    b.write_string(0, 1, "Loan").unwrap();
    b.write_string(1, 1, "L2").unwrap();

    workbook.save_to_buffer().unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIG / ENVELOPE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_config_custom() {
    let config = ApiConfig {
        host: "0.0.0.0".to_string(),
        port: 3000,
        ..Default::default()
    };
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 3000);
}

#[test]
fn test_api_response_ok_and_err() {
    let ok = ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
    });
    assert!(ok.success);
    assert!(ok.error.is_none());

    let err = ApiResponse::<()>::err("boom");
    assert!(!err.success);
    assert_eq!(err.error.as_deref(), Some("boom"));
    assert_ne!(ok.request_id, err.request_id);
}

#[test]
fn test_report_response_skips_absent_schema_error() {
    let json = serde_json::to_value(ReportResponse::default()).unwrap();
    assert!(json.get("schema_error").is_none());
    assert_eq!(json["rows"], 0);
}

#[test]
fn test_process_query_defaults() {
    assert!(ProcessQuery::default().date.is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// ENDPOINT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health_endpoint() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_process_returns_workbook() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/process?date=2022-03-02")
                .body(Body::from(upload_bytes(true)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_MIME);
    assert_eq!(response.headers()[INVALID_ROWS_HEADER], "1");
    assert!(response.headers().get(SCHEMA_ERROR_HEADER).is_none());
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("processed_output.xlsx"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let processed = WorkbookImporter::import_bytes(&bytes).unwrap();
    assert_eq!(processed.sheet_names(), vec!["Processed Data"]);
    let table = &processed.sheets[0];
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.cell(0, "new_ageing"), Some(&CellValue::Number(60.0)));
    assert_eq!(table.cell(1, "new_slab"), Some(&CellValue::text("No Slab")));
}

#[tokio::test]
async fn test_process_schema_error_header() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/process?date=2022-03-02")
                .body(Body::from(upload_bytes(false)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[INVALID_ROWS_HEADER], "0");
    assert!(response.headers()[SCHEMA_ERROR_HEADER]
        .to_str()
        .unwrap()
        .contains("Date of Disbursement"));
}

#[tokio::test]
async fn test_process_bad_date_is_bad_request() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/process?date=02-03-2022")
                .body(Body::from(upload_bytes(true)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_process_rejects_non_workbook() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/process?date=2022-03-02")
                .body(Body::from("not a workbook"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_rejects_empty_body() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_summarizes_run() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/report?date=2022-03-02")
                .body(Body::from(upload_bytes(true)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["reference_date"], "2022-03-02");
    assert_eq!(data["sheets"], serde_json::json!(["Sheet A", "Sheet B"]));
    assert_eq!(data["rows"], 2);
    assert_eq!(data["annotated"], true);
    assert_eq!(data["invalid_date_rows"], 1);
    assert_eq!(data["invalid_row_indices"], serde_json::json!([1]));
    assert_eq!(data["slab_counts"]["<=60"], 1);
    assert_eq!(data["slab_counts"]["No Slab"], 1);
    assert!(data.get("schema_error").is_none());
}

#[tokio::test]
async fn test_report_schema_error() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/report?date=2022-03-02")
                .body(Body::from(upload_bytes(false)))
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["annotated"], false);
    assert_eq!(data["rows"], 2);
    assert!(data["schema_error"]
        .as_str()
        .unwrap()
        .contains("Date of Disbursement"));
    assert_eq!(data["slab_counts"], serde_json::json!({}));
}
