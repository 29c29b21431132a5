//! Domain types for the capital-gains ledger.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Domain primitives: Share, FinancialYear, GainType, Ratio
//! - Raw transaction rows with a tagged per-event view
//! - The MatchedTransaction output record

pub mod decimal;
pub mod matched;
pub mod primitives;
pub mod row;

pub use decimal::Decimal;
pub use matched::{LotKind, MatchedTransaction};
pub use primitives::{FinancialYear, FinancialYearParseError, GainType, Ratio, Share};
pub use row::{Leg, RowError, RowEvent, TransactionRow};
