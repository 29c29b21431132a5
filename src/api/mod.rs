pub mod config;
pub mod export;
pub mod health;
pub mod ledger;
pub mod upload;

use crate::config::Config;
use crate::session::SessionStore;
use crate::tax_config::TaxConfigStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tax_store: Arc<TaxConfigStore>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tax_store: Arc::new(TaxConfigStore::new()),
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/upload", post(upload::upload))
        .route("/ledger", get(ledger::get_ledger))
        .route("/closing-balances", get(ledger::get_closing_balances))
        .route("/capital-gains", get(ledger::get_capital_gains))
        .route("/summary", get(ledger::get_summary))
        .route("/config", get(config::get_config).put(config::put_config))
        .route("/export/next-year", get(export::export_next_year))
        .route("/export/current", get(export::export_current))
        .layer(cors)
        .with_state(state)
}
