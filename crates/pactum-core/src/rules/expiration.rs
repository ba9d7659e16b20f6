//! `expiration_date_exists`: the contract must state when it ends.

use crate::record::ContractRecord;
use crate::types::BreachStatus;

use super::BreachRule;

pub struct ExpirationDateRule;

impl BreachRule for ExpirationDateRule {
    fn id(&self) -> &'static str {
        "expiration_date_exists"
    }

    fn description(&self) -> &'static str {
        "Contract must have an expiration date."
    }

    fn check(&self, record: &ContractRecord) -> (BreachStatus, String) {
        match record.expiration_date {
            Some(date) => (
                BreachStatus::Met,
                format!("Expiration date found: {}", date.format("%Y-%m-%d")),
            ),
            None => (
                BreachStatus::NotMet,
                "No expiration date found in the extracted data.".to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_met_with_date() {
        let record = ContractRecord::new()
            .with_expiration_date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        let (status, details) = ExpirationDateRule.check(&record);
        assert_eq!(status, BreachStatus::Met);
        assert_eq!(details, "Expiration date found: 2025-12-31");
    }

    #[test]
    fn test_not_met_without_date() {
        let (status, _) = ExpirationDateRule.check(&ContractRecord::new());
        assert_eq!(status, BreachStatus::NotMet);
    }

    #[test]
    fn test_effective_date_alone_is_not_enough() {
        let record = ContractRecord::new()
            .with_effective_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(ExpirationDateRule.check(&record).0, BreachStatus::NotMet);
    }
}
