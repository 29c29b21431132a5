//! Upload sessions and their copy-on-write ledgers.
//!
//! A session owns the raw rows it was created from and an `Arc<Ledger>`
//! that is swapped wholesale on recomputation. Readers always see either
//! the previous or the fully rebuilt ledger, never a partial aggregate.

use crate::domain::FinancialYear;
use crate::engine::{Ledger, LedgerError};
use crate::tax_config::TaxConfigStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One upload's unit of work.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub financial_year: FinancialYear,
    ledger: RwLock<Arc<Ledger>>,
}

impl Session {
    fn new(id: Uuid, financial_year: FinancialYear, ledger: Ledger) -> Self {
        Session {
            id,
            financial_year,
            ledger: RwLock::new(Arc::new(ledger)),
        }
    }

    /// The session's ledger, rebuilt first if the tax config moved on
    /// since it was computed.
    ///
    /// # Errors
    /// Propagates [`LedgerError`] from a rebuild; the previous ledger stays
    /// in place on failure.
    pub async fn current_ledger(
        &self,
        store: &TaxConfigStore,
    ) -> Result<Arc<Ledger>, LedgerError> {
        let current = self.ledger.read().await.clone();
        let (config, version) = store.snapshot(&self.financial_year).await;
        if current.config_version == version {
            return Ok(current);
        }
        tracing::info!(
            session = %self.id,
            from = current.config_version,
            to = version,
            "rebuilding ledger for stale tax config"
        );
        let rebuilt = Arc::new(Ledger::build(
            current.rows.clone(),
            self.financial_year.clone(),
            *config,
            version,
        )?);
        *self.ledger.write().await = rebuilt.clone();
        Ok(rebuilt)
    }

    /// The ledger as last computed, without a staleness check.
    pub async fn ledger(&self) -> Arc<Ledger> {
        self.ledger.read().await.clone()
    }
}

/// All live sessions, keyed by their opaque id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly built ledger under a new session id.
    pub async fn create(&self, financial_year: FinancialYear, ledger: Ledger) -> Arc<Session> {
        let id = Uuid::new_v4();
        let session = Arc::new(Session::new(id, financial_year, ledger));
        self.sessions.write().await.insert(id, session.clone());
        tracing::info!(session = %id, "session created");
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Rebuild every session ledger for the given year against the store's
    /// current config. Returns how many sessions were rebuilt.
    ///
    /// # Errors
    /// Stops at the first rebuild failure; sessions already rebuilt keep
    /// their new ledgers, the failing one keeps its old ledger.
    pub async fn rebuild_for_year(
        &self,
        year: &FinancialYear,
        store: &TaxConfigStore,
    ) -> Result<usize, LedgerError> {
        let sessions: Vec<Arc<Session>> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| &s.financial_year == year)
            .cloned()
            .collect();

        let mut rebuilt = 0;
        for session in sessions {
            session.current_ledger(store).await?;
            rebuilt += 1;
        }
        Ok(rebuilt)
    }
}
