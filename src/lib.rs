pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod session;
pub mod sheet;
pub mod tax_config;

pub use config::Config;
pub use domain::{
    Decimal, FinancialYear, GainType, Leg, LotKind, MatchedTransaction, Ratio, Share,
    TransactionRow,
};
pub use engine::{CapitalGains, ClosingBalance, Ledger, LedgerError, LedgerIssue, Summary};
pub use error::AppError;
pub use session::SessionStore;
pub use tax_config::{TaxConfig, TaxConfigPatch, TaxConfigStore};
