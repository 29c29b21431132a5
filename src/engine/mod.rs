//! Pure computation engine for deterministic ledger logic.
//!
//! Everything here is synchronous and I/O-free: raw rows go in, an
//! immutable [`Ledger`] comes out. File parsing, sessions and HTTP live in
//! the adapter layers.

use crate::domain::{Decimal, Share};
use chrono::NaiveDate;
use thiserror::Error;

pub mod aggregator;
pub mod carry_forward;
pub mod classifier;
pub mod ledger;
pub mod lot_matcher;
pub mod tax;

pub use aggregator::{ClosingBalance, Summary};
pub use carry_forward::carry_forward;
pub use classifier::{classify, holding_months};
pub use ledger::{Ledger, LedgerIssue};
pub use lot_matcher::{match_share, Lot, ShareMatch};
pub use tax::{CapitalGains, TaxBreakdown};

/// Engine-level computation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A row violated input constraints; the whole upload is rejected.
    #[error("row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// A sale consumed more than the share's available lot quantity. Never
    /// clamped; clamping would misstate tax liability.
    #[error("share {share} oversold on {sale_date}: short by {shortfall} units")]
    Oversold {
        share: Share,
        sale_date: NaiveDate,
        shortfall: Decimal,
    },
}
