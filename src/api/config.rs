use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;
use crate::domain::FinancialYear;
use crate::error::AppError;
use crate::tax_config::{TaxConfig, TaxConfigPatch};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxConfigResponse {
    pub financial_year: FinancialYear,
    pub tax_config: TaxConfig,
}

pub async fn get_config(State(state): State<AppState>) -> Json<TaxConfigResponse> {
    let year = state.config.financial_year.clone();
    let (config, _) = state.tax_store.snapshot(&year).await;
    Json(TaxConfigResponse {
        financial_year: year,
        tax_config: *config,
    })
}

/// Merge a partial config update. Any live session ledger for the year is
/// rebuilt before the response so subsequent reads see the new regime.
pub async fn put_config(
    State(state): State<AppState>,
    Json(patch): Json<TaxConfigPatch>,
) -> Result<Json<TaxConfigResponse>, AppError> {
    let year = state.config.financial_year.clone();
    let (config, _) = state.tax_store.update(&year, &patch).await?;

    let rebuilt = state
        .sessions
        .rebuild_for_year(&year, &state.tax_store)
        .await?;
    tracing::info!(%year, rebuilt, "ledgers recomputed after config update");

    Ok(Json(TaxConfigResponse {
        financial_year: year,
        tax_config: *config,
    }))
}
