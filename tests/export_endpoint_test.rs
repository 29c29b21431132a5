//! Export endpoint tests: carry-forward spreadsheet and the current-ledger
//! report, including a save-and-reupload round trip.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use capledger::api::{self, AppState};
use capledger::Config;
use std::io::Write;
use tower::util::ServiceExt;

const BOUNDARY: &str = "export-test-boundary";

const CSV: &str = "\
share,openingDate,openingQty,openingAmt,purchaseDate,purchaseQty,purchaseAmt,saleDate,saleQty,saleAmt
TCS,2023-05-15,50,165000,2025-06-10,30,102000,2025-08-20,20,84000
GONE,2024-04-01,10,1000,,,,2025-03-01,10,1600
";

fn setup_app() -> (axum::Router, AppState) {
    let state = AppState::new(Config {
        port: 0,
        financial_year: "2025-2026".parse().unwrap(),
    });
    (api::create_router(state.clone()), state)
}

fn upload_request(csv: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"ledger.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(id) = session {
        builder = builder.header("x-session-id", id);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send_raw(
    app: axum::Router,
    req: Request<Body>,
) -> (StatusCode, Option<String>, axum::body::Bytes) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, body)
}

async fn upload_session(app: &axum::Router) -> String {
    let (status, _, body) = send_raw(app.clone(), upload_request(CSV)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    json["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_export_next_year_carries_open_positions_only() {
    let (app, _) = setup_app();
    let session = upload_session(&app).await;

    let (status, content_type, body) = send_raw(
        app,
        get_request("/export/next-year", Some(&session)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/csv"));

    let csv = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    // Header plus TCS; the fully sold share is omitted.
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("share,openingDate"));
    assert_eq!(lines[1], "TCS,2026-04-01,60,183000,,,,,,");
}

#[tokio::test]
async fn test_export_next_year_reuploads_cleanly() {
    let (app, _) = setup_app();
    let session = upload_session(&app).await;

    let (_, _, body) = send_raw(
        app.clone(),
        get_request("/export/next-year", Some(&session)),
    )
    .await;

    // Save the export the way a client would, then upload the saved file.
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&body).unwrap();
    let saved = std::fs::read_to_string(file.path()).unwrap();

    let (status, _, body) = send_raw(app, upload_request(&saved)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let balances = json["closingBalances"].as_array().unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0]["share"], "TCS");
    assert_eq!(balances[0]["openingQty"], 60.0);
    assert_eq!(balances[0]["openingAmt"], 183000.0);
    assert_eq!(balances[0]["closingQty"], 60.0);
}

#[tokio::test]
async fn test_export_current_report() {
    let (app, _) = setup_app();
    let session = upload_session(&app).await;

    let (status, content_type, body) = send_raw(
        app,
        get_request("/export/current", Some(&session)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/csv"));

    let csv = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    // Header, two shares, totals line.
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("share,openingQty"));
    assert!(lines.iter().any(|l| l.starts_with("TCS,")));
    assert!(lines[3].starts_with("TOTAL,"));
}

#[tokio::test]
async fn test_export_without_session_is_no_holdings() {
    let (app, _) = setup_app();
    for uri in ["/export/next-year", "/export/current"] {
        let (status, content_type, body) = send_raw(app.clone(), get_request(uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("application/json"));
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "no holdings uploaded");
    }
}
