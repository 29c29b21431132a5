use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::ledger::current_ledger;
use crate::api::AppState;
use crate::engine::carry_forward;
use crate::error::AppError;
use crate::sheet;

fn csv_attachment(filename: String, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn no_holdings() -> Response {
    Json(json!({ "message": "no holdings uploaded" })).into_response()
}

/// Next year's opening rows as a spreadsheet in the upload layout.
pub async fn export_next_year(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some((_, ledger)) = current_ledger(&state, &headers).await? else {
        return Ok(no_holdings());
    };

    let next_year = ledger.financial_year.next();
    let rows = carry_forward(&ledger.closing_balances, next_year.start_date());
    let bytes = sheet::write_rows(&rows)?;
    Ok(csv_attachment(format!("opening-{next_year}.csv"), bytes))
}

/// The current ledger's closing-balance report.
pub async fn export_current(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some((_, ledger)) = current_ledger(&state, &headers).await? else {
        return Ok(no_holdings());
    };

    let bytes = sheet::write_report(&ledger)?;
    Ok(csv_attachment(
        format!("ledger-{}.csv", ledger.financial_year),
        bytes,
    ))
}
