//! One full ledger computation: match, classify, aggregate, tax.

use super::aggregator::{close_share, summarize, ClosingBalance, Summary};
use super::classifier::classify;
use super::lot_matcher::match_share;
use super::tax::{self, CapitalGains};
use super::LedgerError;
use crate::domain::{Decimal, FinancialYear, MatchedTransaction, Share, TransactionRow};
use crate::tax_config::TaxConfig;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// A share excluded from the computation, surfaced instead of aborting the
/// whole upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerIssue {
    pub share: Share,
    pub sale_date: NaiveDate,
    /// Units the sale exceeded the available lots by.
    pub shortfall: Decimal,
    pub reason: String,
}

/// The complete derived state for one session's upload.
///
/// Built once from the raw rows and a TaxConfig snapshot; never mutated.
/// A config change produces a fresh Ledger which replaces this one behind
/// the session's pointer.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub financial_year: FinancialYear,
    pub rows: Vec<TransactionRow>,
    pub transactions: Vec<MatchedTransaction>,
    pub closing_balances: Vec<ClosingBalance>,
    pub summary: Summary,
    pub capital_gains: CapitalGains,
    /// The snapshot every classification and tax figure was computed from.
    pub tax_config: TaxConfig,
    /// Config-store version the snapshot was taken at; stale versions
    /// trigger a rebuild on read.
    pub config_version: u64,
    /// Oversold shares excluded from all aggregates.
    pub issues: Vec<LedgerIssue>,
}

impl Ledger {
    /// Compute a ledger over the supplied rows.
    ///
    /// Oversold shares are isolated: each is dropped from the aggregates
    /// and recorded in `issues`, and the rest of the portfolio computes
    /// normally.
    ///
    /// # Errors
    /// Returns [`LedgerError::MalformedRow`] if any row violates input
    /// constraints; nothing is computed in that case.
    pub fn build(
        rows: Vec<TransactionRow>,
        financial_year: FinancialYear,
        tax_config: TaxConfig,
        config_version: u64,
    ) -> Result<Ledger, LedgerError> {
        for (index, row) in rows.iter().enumerate() {
            row.validate().map_err(|e| LedgerError::MalformedRow {
                row: index + 1,
                reason: e.to_string(),
            })?;
        }

        // BTreeMap keeps share iteration deterministic.
        let mut by_share: BTreeMap<Share, Vec<TransactionRow>> = BTreeMap::new();
        for row in &rows {
            by_share.entry(row.share.clone()).or_default().push(row.clone());
        }

        let mut transactions = Vec::new();
        let mut closing_balances = Vec::new();
        let mut issues = Vec::new();

        for (share, share_rows) in &by_share {
            let matched = match match_share(share, share_rows) {
                Ok(matched) => matched,
                Err(LedgerError::Oversold {
                    share,
                    sale_date,
                    shortfall,
                }) => {
                    tracing::warn!(%share, %sale_date, %shortfall, "oversold share excluded");
                    issues.push(LedgerIssue {
                        reason: format!(
                            "sale on {sale_date} exceeds available lots by {shortfall} units"
                        ),
                        share,
                        sale_date,
                        shortfall,
                    });
                    continue;
                }
                Err(other) => return Err(other),
            };

            let classified: Vec<MatchedTransaction> = matched
                .transactions
                .into_iter()
                .map(|tx| classify(tx, &tax_config))
                .collect();

            let balance = close_share(share, share_rows, classified.clone(), &matched.open_lots)?;
            transactions.extend(classified);
            closing_balances.push(balance);
        }

        let summary = summarize(&closing_balances);
        let capital_gains = tax::compute(&transactions, &tax_config);

        tracing::debug!(
            shares = closing_balances.len(),
            transactions = transactions.len(),
            excluded = issues.len(),
            "ledger built"
        );

        Ok(Ledger {
            financial_year,
            rows,
            transactions,
            closing_balances,
            summary,
            capital_gains,
            tax_config,
            config_version,
            issues,
        })
    }
}
