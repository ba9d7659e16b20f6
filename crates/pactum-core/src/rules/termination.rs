//! `termination_clauses_included`: the contract should say how it ends early.
//!
//! `ContractRecord` has no field for termination clauses, so this rule can
//! never be decided and always reports Insufficient Data. It stays in the set
//! until the extraction schema carries termination clauses.

use crate::record::ContractRecord;
use crate::types::BreachStatus;

use super::BreachRule;

pub struct TerminationClausesRule;

impl BreachRule for TerminationClausesRule {
    fn id(&self) -> &'static str {
        "termination_clauses_included"
    }

    fn description(&self) -> &'static str {
        "Contract should include clauses detailing termination conditions."
    }

    fn check(&self, _record: &ContractRecord) -> (BreachStatus, String) {
        (
            BreachStatus::InsufficientData,
            "Termination clauses were not specifically itemized in the initial extraction."
                .to_string(),
        )
    }
}
