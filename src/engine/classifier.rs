//! Holding-period classification of matched sale pairings.

use crate::domain::{Decimal, GainType, MatchedTransaction};
use crate::tax_config::TaxConfig;
use chrono::{Datelike, NaiveDate};

/// Whole months (floor) between two dates. Never negative.
pub fn holding_months(acquired: NaiveDate, sold: NaiveDate) -> u32 {
    let mut months = (sold.year() - acquired.year()) * 12 + sold.month() as i32
        - acquired.month() as i32;
    if sold.day() < acquired.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Label a sale pairing LTCG or STCG and compute its signed gain.
///
/// Uses the TaxConfig snapshot captured at ledger-build time, so one
/// ledger's classifications stay internally consistent across concurrent
/// config updates. Records without a sale pass through untouched.
pub fn classify(tx: MatchedTransaction, config: &TaxConfig) -> MatchedTransaction {
    let (Some(acquired), Some(sold)) = (tx.acquisition_date(), tx.sale_date) else {
        return tx;
    };
    let cost = tx.cost().unwrap_or_else(Decimal::zero);
    let proceeds = tx.sale_amount.unwrap_or_else(Decimal::zero);

    let months = holding_months(acquired, sold);
    let gain_type = if months >= config.ltcg.holding_period_months {
        GainType::Ltcg
    } else {
        GainType::Stcg
    };
    tx.with_gain(gain_type, proceeds - cost)
}
