//! Domain primitives: Share, FinancialYear, GainType, Ratio.

use crate::domain::Decimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stock/scrip identifier (e.g. "TCS", "INFY").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Share(pub String);

impl Share {
    /// Create a Share from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Share(name.into())
    }

    /// Get the share name as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Share {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error parsing a `"YYYY-YYYY"` financial-year string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid financial year {0:?}: expected \"YYYY-YYYY\" with consecutive years")]
pub struct FinancialYearParseError(pub String);

/// A financial year in `"YYYY-YYYY"` form, e.g. "2025-2026".
///
/// The second year must be the first plus one. Indian financial years run
/// April 1 through March 31.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FinancialYear {
    first: i32,
}

impl FinancialYear {
    /// The calendar year the financial year starts in.
    pub fn first_year(&self) -> i32 {
        self.first
    }

    /// The following financial year.
    pub fn next(&self) -> FinancialYear {
        FinancialYear {
            first: self.first + 1,
        }
    }

    /// April 1 of the first calendar year.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.first, 4, 1).expect("April 1 is a valid date")
    }
}

impl std::fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.first + 1)
    }
}

impl FromStr for FinancialYear {
    type Err = FinancialYearParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FinancialYearParseError(s.to_string());
        let (first, second) = s.split_once('-').ok_or_else(err)?;
        if first.len() != 4 || second.len() != 4 {
            return Err(err());
        }
        let first: i32 = first.parse().map_err(|_| err())?;
        let second: i32 = second.parse().map_err(|_| err())?;
        if second != first + 1 {
            return Err(err());
        }
        Ok(FinancialYear { first })
    }
}

impl TryFrom<String> for FinancialYear {
    type Error = FinancialYearParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FinancialYear> for String {
    fn from(fy: FinancialYear) -> String {
        fy.to_string()
    }
}

/// Capital-gain classification by holding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GainType {
    /// Long-term capital gain.
    #[serde(rename = "LTCG")]
    Ltcg,
    /// Short-term capital gain.
    #[serde(rename = "STCG")]
    Stcg,
}

impl std::fmt::Display for GainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainType::Ltcg => write!(f, "LTCG"),
            GainType::Stcg => write!(f, "STCG"),
        }
    }
}

/// A percentage ratio that may be undefined when its basis is zero.
///
/// Zero-denominator guards produce `Undefined` instead of dividing; how an
/// undefined ratio renders ("0.00" vs "0.00%") is decided at the wire
/// boundary, never inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ratio {
    Undefined,
    Value(Decimal),
}

impl Ratio {
    /// Percentage of `part` over `whole`, `Undefined` unless `whole` > 0.
    pub fn percent_of(part: Decimal, whole: Decimal) -> Ratio {
        if whole.is_positive() {
            Ratio::Value(((part / whole) * Decimal::hundred()).round_dp(2))
        } else {
            Ratio::Undefined
        }
    }

    /// Two-decimal percent string: "20.80%", or "0.00%" when undefined.
    pub fn as_percent_string(&self) -> String {
        match self {
            Ratio::Undefined => "0.00%".to_string(),
            Ratio::Value(v) => format!("{}%", v.to_fixed_string(2)),
        }
    }

    /// Serialize as a two-decimal percent string.
    pub fn serialize_percent<S>(ratio: &Ratio, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&ratio.as_percent_string())
    }

    /// Serialize as a JSON number, or the string sentinel "0.00" when
    /// undefined.
    pub fn serialize_number_or_sentinel<S>(ratio: &Ratio, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match ratio {
            Ratio::Undefined => serializer.serialize_str("0.00"),
            Ratio::Value(v) => v.serialize(serializer),
        }
    }
}
