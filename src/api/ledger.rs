use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{FinancialYear, MatchedTransaction};
use crate::engine::{CapitalGains, ClosingBalance, Ledger, LedgerIssue, Summary};
use crate::error::AppError;
use crate::session::Session;
use crate::tax_config::TaxConfig;

/// Header clients present the opaque session id in.
pub const SESSION_HEADER: &str = "x-session-id";

const NO_HOLDINGS: &str = "no holdings uploaded";

/// Full ledger payload returned by upload and `/ledger`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerData {
    pub session_id: Uuid,
    pub financial_year: FinancialYear,
    pub transactions: Vec<MatchedTransaction>,
    pub closing_balances: Vec<ClosingBalance>,
    pub summary: Summary,
    pub capital_gains: CapitalGains,
    pub tax_config: TaxConfig,
    pub issues: Vec<LedgerIssue>,
}

impl LedgerData {
    pub fn new(session_id: Uuid, ledger: &Ledger) -> Self {
        LedgerData {
            session_id,
            financial_year: ledger.financial_year.clone(),
            transactions: ledger.transactions.clone(),
            closing_balances: ledger.closing_balances.clone(),
            summary: ledger.summary,
            capital_gains: ledger.capital_gains,
            tax_config: ledger.tax_config,
            issues: ledger.issues.clone(),
        }
    }
}

/// Resolve the caller's session from the `x-session-id` header. A missing,
/// malformed or unknown id is the normal no-holdings state, not an error.
pub(crate) async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<Arc<Session>> {
    let id = headers.get(SESSION_HEADER)?.to_str().ok()?;
    let id = Uuid::parse_str(id.trim()).ok()?;
    state.sessions.get(&id).await
}

pub(crate) async fn current_ledger(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<(Uuid, Arc<Ledger>)>, AppError> {
    let Some(session) = resolve_session(state, headers).await else {
        return Ok(None);
    };
    let ledger = session.current_ledger(&state.tax_store).await?;
    Ok(Some((session.id, ledger)))
}

fn no_holdings() -> Json<serde_json::Value> {
    Json(json!({
        "message": NO_HOLDINGS,
        "transactions": [],
        "closingBalances": [],
    }))
}

pub async fn get_ledger(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    match current_ledger(&state, &headers).await? {
        Some((id, ledger)) => {
            let data = LedgerData::new(id, &ledger);
            Ok(Json(serde_json::to_value(data).map_err(|e| {
                AppError::Internal(e.to_string())
            })?))
        }
        None => Ok(no_holdings()),
    }
}

pub async fn get_closing_balances(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    match current_ledger(&state, &headers).await? {
        Some((_, ledger)) => Ok(Json(json!({
            "closingBalances": ledger.closing_balances,
            "issues": ledger.issues,
        }))),
        None => Ok(Json(json!({
            "message": NO_HOLDINGS,
            "closingBalances": [],
        }))),
    }
}

pub async fn get_capital_gains(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    match current_ledger(&state, &headers).await? {
        Some((_, ledger)) => Ok(Json(json!({
            "capitalGains": ledger.capital_gains,
            "taxConfig": ledger.tax_config,
        }))),
        None => Ok(Json(json!({
            "message": NO_HOLDINGS,
            "capitalGains": null,
        }))),
    }
}

pub async fn get_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    match current_ledger(&state, &headers).await? {
        Some((_, ledger)) => Ok(Json(json!({ "summary": ledger.summary }))),
        None => Ok(Json(json!({
            "message": NO_HOLDINGS,
            "summary": null,
        }))),
    }
}
