//! FIFO lot matching for one share.
//!
//! Acquisition lots live in an arena indexed from a moving head: consuming
//! a sale mutates the remaining quantity of the lot at the head and only
//! advances past it once fully consumed, so partial consumption splits a
//! lot without reshuffling the queue.

use super::LedgerError;
use crate::domain::{Decimal, LotKind, MatchedTransaction, RowEvent, Share, TransactionRow};
use chrono::NaiveDate;

/// An acquisition lot awaiting consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub kind: LotKind,
    pub acquired: NaiveDate,
    /// Remaining quantity; mutated as sales consume the lot.
    pub remaining: Decimal,
    pub unit_cost: Decimal,
}

impl Lot {
    /// Cost of the remaining quantity at acquisition price.
    pub fn remaining_cost(&self) -> Decimal {
        (self.remaining * self.unit_cost).round_dp(2)
    }
}

/// Output of matching one share's rows.
#[derive(Debug, Clone)]
pub struct ShareMatch {
    /// Sale pairings in consumption order, then open-lot remainders.
    /// Sale pairings carry no gain yet; classification is a separate pass.
    pub transactions: Vec<MatchedTransaction>,
    /// Lots with quantity left after all sales.
    pub open_lots: Vec<Lot>,
}

/// Match one share's rows in file order.
///
/// Opening lots are enqueued ahead of all purchase lots regardless of row
/// interleaving; within each kind, file order is kept. Sales then consume
/// strictly from the queue front.
///
/// # Errors
/// Returns [`LedgerError::Oversold`] when a sale exceeds the available lot
/// quantity. Nothing is clamped and no partial result is returned.
pub fn match_share(share: &Share, rows: &[TransactionRow]) -> Result<ShareMatch, LedgerError> {
    let mut lots: Vec<Lot> = Vec::new();
    for event in rows.iter().flat_map(|r| r.events()) {
        if let RowEvent::Opening(leg) = event {
            lots.push(Lot {
                kind: LotKind::Opening,
                acquired: leg.date,
                remaining: leg.qty,
                unit_cost: leg.unit_cost(),
            });
        }
    }
    for event in rows.iter().flat_map(|r| r.events()) {
        if let RowEvent::Purchase(leg) = event {
            lots.push(Lot {
                kind: LotKind::Purchase,
                acquired: leg.date,
                remaining: leg.qty,
                unit_cost: leg.unit_cost(),
            });
        }
    }

    let mut head = 0usize;
    let mut transactions = Vec::new();

    for event in rows.iter().flat_map(|r| r.events()) {
        let RowEvent::Sale(sale) = event else {
            continue;
        };
        let mut outstanding = sale.qty;
        while outstanding.is_positive() {
            let Some(lot) = lots.get_mut(head) else {
                return Err(LedgerError::Oversold {
                    share: share.clone(),
                    sale_date: sale.date,
                    shortfall: outstanding,
                });
            };
            let consumed = if lot.remaining <= outstanding {
                lot.remaining
            } else {
                outstanding
            };
            let cost = (lot.unit_cost * consumed).round_dp(2);
            let proceeds = ((sale.amount * consumed) / sale.qty).round_dp(2);
            transactions.push(MatchedTransaction::sale_pairing(
                share.clone(),
                lot.kind,
                lot.acquired,
                consumed,
                cost,
                sale.date,
                proceeds,
            ));
            lot.remaining = lot.remaining - consumed;
            outstanding = outstanding - consumed;
            if lot.remaining.is_zero() {
                head += 1;
            }
        }
    }

    let open_lots: Vec<Lot> = lots
        .into_iter()
        .filter(|l| l.remaining.is_positive())
        .collect();

    for lot in &open_lots {
        transactions.push(MatchedTransaction::open_lot(
            share.clone(),
            lot.kind,
            lot.acquired,
            lot.remaining,
            lot.remaining_cost(),
        ));
    }

    Ok(ShareMatch {
        transactions,
        open_lots,
    })
}
