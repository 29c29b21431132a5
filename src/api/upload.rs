use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::ledger::LedgerData;
use crate::api::AppState;
use crate::engine::Ledger;
use crate::error::AppError;
use crate::sheet;

/// Accept a multipart spreadsheet upload, compute the ledger and open a
/// session for it. The returned payload carries the session id clients
/// present on subsequent reads.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LedgerData>, AppError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            file = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read file: {e}")))?,
            );
            break;
        }
    }
    let bytes = file.ok_or_else(|| AppError::BadRequest("missing \"file\" field".to_string()))?;

    let rows = sheet::parse_rows(&bytes)?;
    if rows.is_empty() {
        return Err(AppError::BadRequest("spreadsheet has no data rows".to_string()));
    }

    let year = state.config.financial_year.clone();
    let (config, version) = state.tax_store.snapshot(&year).await;
    let ledger = Ledger::build(rows, year.clone(), *config, version)?;

    tracing::info!(
        %year,
        shares = ledger.closing_balances.len(),
        excluded = ledger.issues.len(),
        "upload accepted"
    );

    let session = state.sessions.create(year, ledger).await;
    let ledger = session.ledger().await;
    Ok(Json(LedgerData::new(session.id, &ledger)))
}
