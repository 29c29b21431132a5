//! Tax regime configuration and its per-financial-year store.
//!
//! The store hands out snapshots, never live references: a ledger built
//! against snapshot version N stays internally consistent even if the
//! config is updated mid-computation. Updates are partial merges validated
//! before they replace anything; a failed update leaves the prior config
//! untouched.

use crate::domain::{Decimal, FinancialYear};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Short-term capital gains rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StcgRules {
    /// Tax rate, percent.
    pub rate: Decimal,
    /// Cess on the base tax, percent.
    pub cess: Decimal,
    /// Holdings shorter than this many whole months are short-term.
    #[serde(rename = "holdingPeriod")]
    pub holding_period_months: u32,
}

/// Long-term capital gains rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LtcgRules {
    /// Tax rate, percent.
    pub rate: Decimal,
    /// Cess on the base tax, percent.
    pub cess: Decimal,
    /// Holdings of at least this many whole months are long-term.
    #[serde(rename = "holdingPeriod")]
    pub holding_period_months: u32,
    /// LTCG amount excluded from taxation before the rate applies.
    pub exemption_limit: Decimal,
    /// Carried on the wire for clients; the engine never indexes cost.
    pub indexation_benefit: bool,
}

/// The tax regime for one financial year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxConfig {
    pub stcg: StcgRules,
    pub ltcg: LtcgRules,
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig {
            stcg: StcgRules {
                rate: Decimal::from_int(20),
                cess: Decimal::from_int(4),
                holding_period_months: 12,
            },
            ltcg: LtcgRules {
                rate: Decimal::from_scaled(125, 1),
                cess: Decimal::from_int(4),
                holding_period_months: 12,
                exemption_limit: Decimal::from_int(125_000),
                indexation_benefit: false,
            },
        }
    }
}

/// Partial update to one bucket's rules.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketPatch {
    pub rate: Option<Decimal>,
    pub cess: Option<Decimal>,
    #[serde(rename = "holdingPeriod")]
    pub holding_period_months: Option<u32>,
    pub exemption_limit: Option<Decimal>,
    pub indexation_benefit: Option<bool>,
}

/// Partial update to a TaxConfig. Only supplied fields replace the current
/// values. `unified_cess` is a caller convenience that sets both buckets'
/// cess in one update.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxConfigPatch {
    pub stcg: Option<BucketPatch>,
    pub ltcg: Option<BucketPatch>,
    pub unified_cess: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxConfigError {
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },
    #[error("ltcg exemption limit must not be negative")]
    NegativeExemption,
}

impl TaxConfig {
    /// Apply a partial patch, validating the merged result.
    ///
    /// # Errors
    /// Returns `TaxConfigError` if any merged rate, cess or holding period
    /// is non-positive, or the exemption limit is negative. The receiver is
    /// not modified.
    pub fn apply(&self, patch: &TaxConfigPatch) -> Result<TaxConfig, TaxConfigError> {
        let mut next = *self;

        if let Some(p) = &patch.stcg {
            if let Some(rate) = p.rate {
                next.stcg.rate = rate;
            }
            if let Some(cess) = p.cess {
                next.stcg.cess = cess;
            }
            if let Some(months) = p.holding_period_months {
                next.stcg.holding_period_months = months;
            }
        }
        if let Some(p) = &patch.ltcg {
            if let Some(rate) = p.rate {
                next.ltcg.rate = rate;
            }
            if let Some(cess) = p.cess {
                next.ltcg.cess = cess;
            }
            if let Some(months) = p.holding_period_months {
                next.ltcg.holding_period_months = months;
            }
            if let Some(limit) = p.exemption_limit {
                next.ltcg.exemption_limit = limit;
            }
            if let Some(flag) = p.indexation_benefit {
                next.ltcg.indexation_benefit = flag;
            }
        }
        if let Some(cess) = patch.unified_cess {
            next.stcg.cess = cess;
            next.ltcg.cess = cess;
        }

        next.validate()?;
        Ok(next)
    }

    fn validate(&self) -> Result<(), TaxConfigError> {
        if !self.stcg.rate.is_positive() {
            return Err(TaxConfigError::NonPositive { field: "stcg rate" });
        }
        if !self.stcg.cess.is_positive() {
            return Err(TaxConfigError::NonPositive { field: "stcg cess" });
        }
        if self.stcg.holding_period_months == 0 {
            return Err(TaxConfigError::NonPositive {
                field: "stcg holding period",
            });
        }
        if !self.ltcg.rate.is_positive() {
            return Err(TaxConfigError::NonPositive { field: "ltcg rate" });
        }
        if !self.ltcg.cess.is_positive() {
            return Err(TaxConfigError::NonPositive { field: "ltcg cess" });
        }
        if self.ltcg.holding_period_months == 0 {
            return Err(TaxConfigError::NonPositive {
                field: "ltcg holding period",
            });
        }
        if self.ltcg.exemption_limit.is_negative() {
            return Err(TaxConfigError::NegativeExemption);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    config: Arc<TaxConfig>,
    version: u64,
}

impl Default for Entry {
    fn default() -> Self {
        Entry {
            config: Arc::new(TaxConfig::default()),
            version: 1,
        }
    }
}

/// Per-financial-year tax config store with snapshot reads.
///
/// The version acts as a staleness watermark: every successful update bumps
/// it, and a ledger built at an older version is rebuilt on next read.
#[derive(Debug, Default)]
pub struct TaxConfigStore {
    inner: RwLock<HashMap<FinancialYear, Entry>>,
}

impl TaxConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current config and version for the year, installing defaults on
    /// first access.
    pub async fn snapshot(&self, year: &FinancialYear) -> (Arc<TaxConfig>, u64) {
        {
            let map = self.inner.read().await;
            if let Some(entry) = map.get(year) {
                return (entry.config.clone(), entry.version);
            }
        }
        let mut map = self.inner.write().await;
        let entry = map.entry(year.clone()).or_default();
        (entry.config.clone(), entry.version)
    }

    /// Current version for the year (1 if never touched).
    pub async fn version(&self, year: &FinancialYear) -> u64 {
        self.inner
            .read()
            .await
            .get(year)
            .map(|e| e.version)
            .unwrap_or(1)
    }

    /// Merge a patch into the year's config.
    ///
    /// # Errors
    /// Returns `TaxConfigError` on validation failure; the stored config and
    /// version are unchanged in that case.
    pub async fn update(
        &self,
        year: &FinancialYear,
        patch: &TaxConfigPatch,
    ) -> Result<(Arc<TaxConfig>, u64), TaxConfigError> {
        let mut map = self.inner.write().await;
        let entry = map.entry(year.clone()).or_default();
        let next = entry.config.apply(patch)?;
        entry.config = Arc::new(next);
        entry.version += 1;
        tracing::info!(%year, version = entry.version, "tax config updated");
        Ok((entry.config.clone(), entry.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year() -> FinancialYear {
        "2025-2026".parse().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = TaxConfig::default();
        assert_eq!(config.stcg.rate, Decimal::from_int(20));
        assert_eq!(config.ltcg.rate, Decimal::from_scaled(125, 1));
        assert_eq!(config.ltcg.exemption_limit, Decimal::from_int(125_000));
        assert_eq!(config.ltcg.holding_period_months, 12);
        assert!(!config.ltcg.indexation_benefit);
    }

    #[test]
    fn test_apply_partial_merge() {
        let config = TaxConfig::default();
        let patch = TaxConfigPatch {
            ltcg: Some(BucketPatch {
                rate: Some(Decimal::from_int(10)),
                ..BucketPatch::default()
            }),
            ..TaxConfigPatch::default()
        };
        let next = config.apply(&patch).unwrap();
        assert_eq!(next.ltcg.rate, Decimal::from_int(10));
        // Untouched fields carry over.
        assert_eq!(next.ltcg.exemption_limit, config.ltcg.exemption_limit);
        assert_eq!(next.stcg, config.stcg);
    }

    #[test]
    fn test_apply_unified_cess() {
        let config = TaxConfig::default();
        let patch = TaxConfigPatch {
            unified_cess: Some(Decimal::from_int(5)),
            ..TaxConfigPatch::default()
        };
        let next = config.apply(&patch).unwrap();
        assert_eq!(next.stcg.cess, Decimal::from_int(5));
        assert_eq!(next.ltcg.cess, Decimal::from_int(5));
    }

    #[test]
    fn test_apply_rejects_invalid_values() {
        let config = TaxConfig::default();

        let patch = TaxConfigPatch {
            stcg: Some(BucketPatch {
                rate: Some(Decimal::zero()),
                ..BucketPatch::default()
            }),
            ..TaxConfigPatch::default()
        };
        assert_eq!(
            config.apply(&patch),
            Err(TaxConfigError::NonPositive { field: "stcg rate" })
        );

        let patch = TaxConfigPatch {
            ltcg: Some(BucketPatch {
                exemption_limit: Some(Decimal::from_int(-1)),
                ..BucketPatch::default()
            }),
            ..TaxConfigPatch::default()
        };
        assert_eq!(config.apply(&patch), Err(TaxConfigError::NegativeExemption));

        let patch = TaxConfigPatch {
            ltcg: Some(BucketPatch {
                holding_period_months: Some(0),
                ..BucketPatch::default()
            }),
            ..TaxConfigPatch::default()
        };
        assert!(config.apply(&patch).is_err());
    }

    #[tokio::test]
    async fn test_store_snapshot_and_version_bump() {
        let store = TaxConfigStore::new();
        let (config, v1) = store.snapshot(&year()).await;
        assert_eq!(v1, 1);
        assert_eq!(*config, TaxConfig::default());

        let patch = TaxConfigPatch {
            ltcg: Some(BucketPatch {
                holding_period_months: Some(24),
                ..BucketPatch::default()
            }),
            ..TaxConfigPatch::default()
        };
        let (updated, v2) = store.update(&year(), &patch).await.unwrap();
        assert_eq!(v2, 2);
        assert_eq!(updated.ltcg.holding_period_months, 24);

        // Earlier snapshot is unaffected: reads copy, never alias.
        assert_eq!(config.ltcg.holding_period_months, 12);
    }

    #[tokio::test]
    async fn test_store_failed_update_retains_prior() {
        let store = TaxConfigStore::new();
        let (_, v1) = store.snapshot(&year()).await;

        let patch = TaxConfigPatch {
            stcg: Some(BucketPatch {
                cess: Some(Decimal::from_int(-4)),
                ..BucketPatch::default()
            }),
            ..TaxConfigPatch::default()
        };
        assert!(store.update(&year(), &patch).await.is_err());

        let (config, v2) = store.snapshot(&year()).await;
        assert_eq!(v2, v1);
        assert_eq!(*config, TaxConfig::default());
    }

    #[tokio::test]
    async fn test_store_is_keyed_by_year() {
        let store = TaxConfigStore::new();
        let other: FinancialYear = "2024-2025".parse().unwrap();

        let patch = TaxConfigPatch {
            ltcg: Some(BucketPatch {
                rate: Some(Decimal::from_int(10)),
                ..BucketPatch::default()
            }),
            ..TaxConfigPatch::default()
        };
        store.update(&year(), &patch).await.unwrap();

        let (untouched, _) = store.snapshot(&other).await;
        assert_eq!(untouched.ltcg.rate, Decimal::from_scaled(125, 1));
    }
}
