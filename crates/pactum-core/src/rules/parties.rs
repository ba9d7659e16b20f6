//! `min_two_parties`: a contract needs at least two counterparties.

use crate::record::ContractRecord;
use crate::types::BreachStatus;

use super::BreachRule;

pub struct MinTwoPartiesRule;

impl BreachRule for MinTwoPartiesRule {
    fn id(&self) -> &'static str {
        "min_two_parties"
    }

    fn description(&self) -> &'static str {
        "Contract must involve at least two distinct parties."
    }

    fn check(&self, record: &ContractRecord) -> (BreachStatus, String) {
        let count = record.parties.len();
        if count >= 2 {
            (BreachStatus::Met, format!("{} parties found.", count))
        } else {
            (
                BreachStatus::NotMet,
                format!("Fewer than two parties found ({} extracted).", count),
            )
        }
    }
}
