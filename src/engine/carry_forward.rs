//! Projection of closing balances into next-year opening rows.

use super::aggregator::ClosingBalance;
use crate::domain::{Leg, TransactionRow};
use chrono::NaiveDate;

/// One opening row per share still held, dated at the supplied start of the
/// next financial year. The date is an external input; the engine never
/// derives it. Flat shares are omitted.
pub fn carry_forward(balances: &[ClosingBalance], opening_date: NaiveDate) -> Vec<TransactionRow> {
    balances
        .iter()
        .filter(|b| b.closing_qty.is_positive())
        .map(|b| {
            TransactionRow::opening_only(
                b.share.clone(),
                Leg::new(opening_date, b.closing_qty, b.closing_amount),
            )
        })
        .collect()
}
