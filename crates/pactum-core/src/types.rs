//! Verdict and estimate types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of evaluating one breach rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreachStatus {
    /// The rule is satisfied by the record
    #[serde(rename = "Met")]
    Met,

    /// The rule is not satisfied (potential breach or missing information)
    #[serde(rename = "Not Met")]
    NotMet,

    /// The record does not carry enough information to decide
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
}

impl BreachStatus {
    pub fn is_met(&self) -> bool {
        matches!(self, BreachStatus::Met)
    }

    pub fn is_not_met(&self) -> bool {
        matches!(self, BreachStatus::NotMet)
    }
}

impl fmt::Display for BreachStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreachStatus::Met => write!(f, "Met"),
            BreachStatus::NotMet => write!(f, "Not Met"),
            BreachStatus::InsufficientData => write!(f, "Insufficient Data"),
        }
    }
}

/// Verdict for one rule against one contract record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreachVerdict {
    pub rule_id: String,
    pub rule_description: String,
    pub status: BreachStatus,
    /// Human-readable explanation of the finding
    pub details: String,
}

/// An amount of money held in minor units (cents) to keep arithmetic exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub minor_units: i64,
    /// ISO 4217 code (e.g., "USD")
    pub currency: String,
}

impl Money {
    pub fn new(minor_units: i64, currency: impl Into<String>) -> Self {
        Self {
            minor_units,
            currency: currency.into(),
        }
    }

    /// Apply a rate expressed in basis points, rounding half away from zero.
    ///
    /// Results beyond the `i64` range saturate.
    pub fn percent_bp(&self, basis_points: u32) -> Money {
        let scaled = i128::from(self.minor_units) * i128::from(basis_points);
        let rounded = if scaled >= 0 {
            (scaled + 5_000) / 10_000
        } else {
            (scaled - 5_000) / 10_000
        };
        let minor_units = i64::try_from(rounded).unwrap_or(if rounded < 0 {
            i64::MIN
        } else {
            i64::MAX
        });
        Money::new(minor_units, self.currency.clone())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor_units < 0 { "-" } else { "" };
        let abs = self.minor_units.unsigned_abs();
        let whole = (abs / 100).to_string();
        let cents = abs % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}{}.{:02} {}", sign, grouped, cents, self.currency)
    }
}

/// The quantification attached to a penalty estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PenaltyAmount {
    /// A concrete amount derived from the record
    Computed { amount: Money, formula: String },

    /// A formula that could not be evaluated from the record alone
    Formula { expression: String },

    /// No amount applies
    NotApplicable,
}

impl fmt::Display for PenaltyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PenaltyAmount::Computed { amount, formula } => write!(f, "{} ({})", amount, formula),
            PenaltyAmount::Formula { expression } => write!(f, "{}", expression),
            PenaltyAmount::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// A possibly approximate monetary consequence tied to a clause or breach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyEstimate {
    /// Breach type or clause (e.g., "Late Payment")
    pub clause_label: String,
    pub description: String,
    pub amount_formula: PenaltyAmount,
    pub trigger_condition: String,
    pub notes: String,

    /// Rule id of the NotMet verdict this estimate was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_rule: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_with_display_names() {
        let json = serde_json::to_string(&BreachStatus::InsufficientData).unwrap();
        assert_eq!(json, "\"Insufficient Data\"");
        assert_eq!(BreachStatus::NotMet.to_string(), "Not Met");
    }

    #[test]
    fn test_money_display_groups_thousands() {
        assert_eq!(Money::new(1_000_000, "USD").to_string(), "10,000.00 USD");
        assert_eq!(Money::new(50_005, "EUR").to_string(), "500.05 EUR");
        assert_eq!(Money::new(99, "GBP").to_string(), "0.99 GBP");
        assert_eq!(Money::new(123_456_789, "USD").to_string(), "1,234,567.89 USD");
    }

    #[test]
    fn test_percent_bp_rounds_half_up() {
        let monthly = Money::new(1_000_000, "USD");
        assert_eq!(monthly.percent_bp(500), Money::new(50_000, "USD"));

        // 5% of 10,000.50 is 500.025, rounded to 500.03
        let odd = Money::new(1_000_050, "USD");
        assert_eq!(odd.percent_bp(500).minor_units, 50_003);
    }

    #[test]
    fn test_percent_bp_saturates_instead_of_wrapping() {
        let large = Money::new(i64::MAX / 2, "USD");
        assert_eq!(large.percent_bp(u32::MAX).minor_units, i64::MAX);

        let negative = Money::new(i64::MIN / 2, "USD");
        assert_eq!(negative.percent_bp(u32::MAX).minor_units, i64::MIN);

        // Above 100% is still exact while it fits
        assert_eq!(Money::new(10_000, "USD").percent_bp(25_000).minor_units, 25_000);
    }

    #[test]
    fn test_amount_tagged_serialization() {
        let json = serde_json::to_value(PenaltyAmount::NotApplicable).unwrap();
        assert_eq!(json["kind"], "not_applicable");
    }
}
