//! Per-share closing balances and the portfolio summary.

use super::lot_matcher::Lot;
use super::LedgerError;
use crate::domain::{Decimal, GainType, MatchedTransaction, Ratio, Share, TransactionRow};
use chrono::NaiveDate;
use serde::Serialize;

/// Closing position of one share at financial-year end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosingBalance {
    pub share: Share,
    pub opening_qty: Decimal,
    #[serde(rename = "openingAmt")]
    pub opening_amount: Decimal,
    pub purchase_qty: Decimal,
    #[serde(rename = "purchaseAmt")]
    pub purchase_amount: Decimal,
    pub sale_qty: Decimal,
    #[serde(rename = "saleAmt")]
    pub sale_amount: Decimal,
    /// `opening_qty + purchase_qty − sale_qty`, by conservation.
    pub closing_qty: Decimal,
    /// `opening_amount + purchase_amount − sale_amount`, by conservation.
    #[serde(rename = "closingAmt")]
    pub closing_amount: Decimal,
    /// `closing_amount / closing_qty`, 0 when the position is flat.
    pub avg_cost_price: Decimal,
    pub realized_gain: Decimal,
    pub ltcg: Decimal,
    pub stcg: Decimal,
    /// Book value of remaining open lots less the conservation-derived
    /// closing amount, i.e. closing value − remaining cost basis.
    pub unrealized_gain: Decimal,
    /// Earliest acquisition date still contributing to open lots.
    pub first_purchase_date: Option<NaiveDate>,
    pub transactions: Vec<MatchedTransaction>,
}

/// Portfolio-wide totals over every closing balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_opening_value: Decimal,
    pub total_purchase_value: Decimal,
    pub total_sale_value: Decimal,
    pub total_closing_value: Decimal,
    pub total_realized_gain: Decimal,
    pub total_unrealized_gain: Decimal,
    /// `(realized + unrealized) / (opening + purchase) × 100`; the string
    /// sentinel "0.00" on the wire when the basis is zero.
    #[serde(serialize_with = "Ratio::serialize_number_or_sentinel")]
    pub portfolio_return: Ratio,
}

/// Roll one share's rows, classified transactions and open lots into its
/// closing balance.
///
/// Quantity and amount sums come from the raw rows, not the matched lots,
/// so original magnitudes survive even when matching output is filtered.
///
/// # Errors
/// Returns [`LedgerError::Oversold`] when conservation would go negative.
/// The matcher rejects such inputs first; this guard keeps the invariant
/// local to the aggregate as well.
pub fn close_share(
    share: &Share,
    rows: &[TransactionRow],
    transactions: Vec<MatchedTransaction>,
    open_lots: &[Lot],
) -> Result<ClosingBalance, LedgerError> {
    let mut opening_qty = Decimal::zero();
    let mut opening_amount = Decimal::zero();
    let mut purchase_qty = Decimal::zero();
    let mut purchase_amount = Decimal::zero();
    let mut sale_qty = Decimal::zero();
    let mut sale_amount = Decimal::zero();
    let mut last_sale_date: Option<NaiveDate> = None;

    for row in rows {
        if let Some(leg) = &row.opening {
            opening_qty = opening_qty + leg.qty;
            opening_amount = opening_amount + leg.amount;
        }
        if let Some(leg) = &row.purchase {
            purchase_qty = purchase_qty + leg.qty;
            purchase_amount = purchase_amount + leg.amount;
        }
        if let Some(leg) = &row.sale {
            sale_qty = sale_qty + leg.qty;
            sale_amount = sale_amount + leg.amount;
            last_sale_date = last_sale_date.max(Some(leg.date));
        }
    }

    let closing_qty = opening_qty + purchase_qty - sale_qty;
    if closing_qty.is_negative() {
        return Err(LedgerError::Oversold {
            share: share.clone(),
            sale_date: last_sale_date.unwrap_or_else(|| {
                NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date")
            }),
            shortfall: closing_qty.abs(),
        });
    }
    let closing_amount = opening_amount + purchase_amount - sale_amount;

    let avg_cost_price = if closing_qty.is_positive() {
        (closing_amount / closing_qty).round_dp(2)
    } else {
        Decimal::zero()
    };

    let mut realized_gain = Decimal::zero();
    let mut ltcg = Decimal::zero();
    let mut stcg = Decimal::zero();
    for tx in &transactions {
        if let Some(gain) = tx.gain {
            realized_gain = realized_gain + gain;
            match tx.gain_type {
                Some(GainType::Ltcg) => ltcg = ltcg + gain,
                Some(GainType::Stcg) => stcg = stcg + gain,
                None => {}
            }
        }
    }

    let remaining_cost_basis: Decimal = open_lots.iter().map(|l| l.remaining_cost()).sum();
    let unrealized_gain = closing_amount - remaining_cost_basis;
    let first_purchase_date = open_lots.iter().map(|l| l.acquired).min();

    Ok(ClosingBalance {
        share: share.clone(),
        opening_qty,
        opening_amount,
        purchase_qty,
        purchase_amount,
        sale_qty,
        sale_amount,
        closing_qty,
        closing_amount,
        avg_cost_price,
        realized_gain,
        ltcg,
        stcg,
        unrealized_gain,
        first_purchase_date,
        transactions,
    })
}

/// Sum every closing balance into the portfolio summary. Order-independent,
/// so a parallel per-share matching pass reduces deterministically.
pub fn summarize(balances: &[ClosingBalance]) -> Summary {
    let total_opening_value: Decimal = balances.iter().map(|b| b.opening_amount).sum();
    let total_purchase_value: Decimal = balances.iter().map(|b| b.purchase_amount).sum();
    let total_sale_value: Decimal = balances.iter().map(|b| b.sale_amount).sum();
    let total_closing_value: Decimal = balances.iter().map(|b| b.closing_amount).sum();
    let total_realized_gain: Decimal = balances.iter().map(|b| b.realized_gain).sum();
    let total_unrealized_gain: Decimal = balances.iter().map(|b| b.unrealized_gain).sum();

    Summary {
        total_opening_value,
        total_purchase_value,
        total_sale_value,
        total_closing_value,
        total_realized_gain,
        total_unrealized_gain,
        portfolio_return: Ratio::percent_of(
            total_realized_gain + total_unrealized_gain,
            total_opening_value + total_purchase_value,
        ),
    }
}
