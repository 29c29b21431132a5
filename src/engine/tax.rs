//! Portfolio-wide capital-gains tax computation.

use crate::domain::{Decimal, GainType, MatchedTransaction, Ratio};
use crate::tax_config::TaxConfig;
use serde::Serialize;

/// Tax figures for one gain bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub taxable_amount: Decimal,
    /// Rate applied, percent.
    pub rate: Decimal,
    pub base_tax: Decimal,
    pub cess_amount: Decimal,
    pub total_tax: Decimal,
    /// Total tax over the bucket's gross gain; "0.00%" when gross is not
    /// positive.
    #[serde(serialize_with = "Ratio::serialize_percent")]
    pub effective_rate: Ratio,
}

impl TaxBreakdown {
    /// Tax a bucket: `base = taxable × rate/100`, `cess = base × cess/100`.
    ///
    /// `taxable` must already be exemption-adjusted and clamped at zero;
    /// `gross` is the bucket's signed gain total used for the effective
    /// rate.
    fn assess(taxable: Decimal, gross: Decimal, rate: Decimal, cess: Decimal) -> TaxBreakdown {
        let base_tax = (taxable * rate / Decimal::hundred()).round_dp(2);
        let cess_amount = (base_tax * cess / Decimal::hundred()).round_dp(2);
        let total_tax = base_tax + cess_amount;
        TaxBreakdown {
            taxable_amount: taxable,
            rate,
            base_tax,
            cess_amount,
            total_tax,
            effective_rate: Ratio::percent_of(total_tax, gross),
        }
    }
}

/// Aggregated capital-gains position and tax payable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGains {
    /// Signed LTCG total; losses can pull it below zero.
    #[serde(rename = "totalLTCG")]
    pub total_ltcg: Decimal,
    /// Signed STCG total.
    #[serde(rename = "totalSTCG")]
    pub total_stcg: Decimal,
    pub ltcg_exemption: Decimal,
    /// `max(0, total_ltcg − exemption)`.
    pub ltcg_after_exemption: Decimal,
    pub ltcg_tax: TaxBreakdown,
    pub stcg_tax: TaxBreakdown,
    pub total_tax: Decimal,
    /// `(total_ltcg + total_stcg) − total_tax`.
    pub net_gain: Decimal,
}

/// Compute tax payable over every classified sale pairing in the portfolio.
///
/// The exemption applies once, to the net-positive LTCG pool; it is neither
/// carried forward nor split per lot. Loss buckets produce zero tax, never
/// negative.
pub fn compute(transactions: &[MatchedTransaction], config: &TaxConfig) -> CapitalGains {
    let mut total_ltcg = Decimal::zero();
    let mut total_stcg = Decimal::zero();
    for tx in transactions {
        match (tx.gain_type, tx.gain) {
            (Some(GainType::Ltcg), Some(gain)) => total_ltcg = total_ltcg + gain,
            (Some(GainType::Stcg), Some(gain)) => total_stcg = total_stcg + gain,
            _ => {}
        }
    }

    let exemption = config.ltcg.exemption_limit;
    let ltcg_after_exemption = (total_ltcg - exemption).or_zero_if_negative();

    let ltcg_tax = TaxBreakdown::assess(
        ltcg_after_exemption,
        total_ltcg,
        config.ltcg.rate,
        config.ltcg.cess,
    );
    let stcg_tax = TaxBreakdown::assess(
        total_stcg.or_zero_if_negative(),
        total_stcg,
        config.stcg.rate,
        config.stcg.cess,
    );

    let total_tax = ltcg_tax.total_tax + stcg_tax.total_tax;
    CapitalGains {
        total_ltcg,
        total_stcg,
        ltcg_exemption: exemption,
        ltcg_after_exemption,
        ltcg_tax,
        stcg_tax,
        total_tax,
        net_gain: total_ltcg + total_stcg - total_tax,
    }
}
