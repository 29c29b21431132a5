//! Raw ledger input rows and their tagged event view.
//!
//! A spreadsheet row carries up to three independent (date, qty, amount)
//! legs: opening balance, purchase, sale. The matcher never pattern-matches
//! on the loose row shape directly; it consumes the tagged [`RowEvent`]
//! view so the acquisition-ordering rules stay exhaustive.

use crate::domain::{Decimal, Share};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One (date, quantity, amount) triple of a transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub date: NaiveDate,
    pub qty: Decimal,
    pub amount: Decimal,
}

impl Leg {
    pub fn new(date: NaiveDate, qty: Decimal, amount: Decimal) -> Self {
        Leg { date, qty, amount }
    }

    /// Per-unit acquisition cost. Zero when the leg has no quantity.
    pub fn unit_cost(&self) -> Decimal {
        if self.qty.is_positive() {
            self.amount / self.qty
        } else {
            Decimal::zero()
        }
    }
}

/// A raw per-stock transaction row as uploaded. Any subset of the legs may
/// be populated; multiple rows per share represent distinct lot events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    pub share: Share,
    pub opening: Option<Leg>,
    pub purchase: Option<Leg>,
    pub sale: Option<Leg>,
}

/// A constraint violation on a single row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("share identifier is empty")]
    EmptyShare,
    #[error("{leg} quantity is negative")]
    NegativeQty { leg: &'static str },
    #[error("{leg} amount is negative")]
    NegativeAmount { leg: &'static str },
}

/// A single lot event extracted from a row, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEvent {
    Opening(Leg),
    Purchase(Leg),
    Sale(Leg),
}

impl TransactionRow {
    pub fn new(share: Share) -> Self {
        TransactionRow {
            share,
            opening: None,
            purchase: None,
            sale: None,
        }
    }

    /// Row carrying only an opening leg, as produced by carry-forward.
    pub fn opening_only(share: Share, leg: Leg) -> Self {
        TransactionRow {
            share,
            opening: Some(leg),
            purchase: None,
            sale: None,
        }
    }

    /// Check non-negativity and identifier constraints.
    pub fn validate(&self) -> Result<(), RowError> {
        if self.share.as_str().trim().is_empty() {
            return Err(RowError::EmptyShare);
        }
        for (label, leg) in [
            ("opening", &self.opening),
            ("purchase", &self.purchase),
            ("sale", &self.sale),
        ] {
            if let Some(leg) = leg {
                if leg.qty.is_negative() {
                    return Err(RowError::NegativeQty { leg: label });
                }
                if leg.amount.is_negative() {
                    return Err(RowError::NegativeAmount { leg: label });
                }
            }
        }
        Ok(())
    }

    /// The row's populated legs with quantity > 0, tagged by kind, in
    /// opening, purchase, sale order.
    pub fn events(&self) -> impl Iterator<Item = RowEvent> + '_ {
        let opening = self
            .opening
            .filter(|l| l.qty.is_positive())
            .map(RowEvent::Opening);
        let purchase = self
            .purchase
            .filter(|l| l.qty.is_positive())
            .map(RowEvent::Purchase);
        let sale = self.sale.filter(|l| l.qty.is_positive()).map(RowEvent::Sale);
        opening.into_iter().chain(purchase).chain(sale)
    }
}
