//! `financial_terms_specified`: the contract should state its consideration.
//!
//! Missing terms are ambiguous rather than a violation: the extraction may
//! simply not have surfaced them, so absence maps to Insufficient Data.

use crate::record::ContractRecord;
use crate::types::BreachStatus;

use super::BreachRule;

pub struct FinancialTermsRule;

impl BreachRule for FinancialTermsRule {
    fn id(&self) -> &'static str {
        "financial_terms_specified"
    }

    fn description(&self) -> &'static str {
        "Contract should specify clear financial terms or considerations."
    }

    fn check(&self, record: &ContractRecord) -> (BreachStatus, String) {
        match record.financial_terms.as_deref().map(str::trim) {
            Some(terms) if !terms.is_empty() => (
                BreachStatus::Met,
                format!("Financial terms found: {}", terms),
            ),
            _ => (
                BreachStatus::InsufficientData,
                "No specific financial terms explicitly extracted.".to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_met_with_terms() {
        let record = ContractRecord::new().with_financial_terms("Client pays $10,000 USD monthly.");
        let (status, details) = FinancialTermsRule.check(&record);
        assert_eq!(status, BreachStatus::Met);
        assert!(details.ends_with("Client pays $10,000 USD monthly."));
    }

    #[test]
    fn test_missing_terms_insufficient_not_violation() {
        let (status, _) = FinancialTermsRule.check(&ContractRecord::new());
        assert_eq!(status, BreachStatus::InsufficientData);
    }

    #[test]
    fn test_blank_terms_insufficient() {
        // Built directly, bypassing parser normalization
        let record = ContractRecord::new().with_financial_terms("  ");
        assert_eq!(FinancialTermsRule.check(&record).0, BreachStatus::InsufficientData);
    }
}
