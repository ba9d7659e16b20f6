//! Breach rules.
//!
//! Each rule is a closed-form predicate over a `ContractRecord` and yields
//! Met, Not Met or Insufficient Data together with a details string.
//!
//! | Rule | Met when | Otherwise |
//! |------|----------|-----------|
//! | `expiration_date_exists` | expiration date present | Not Met |
//! | `min_two_parties` | at least two parties | Not Met |
//! | `financial_terms_specified` | financial terms present | Insufficient Data |
//! | `termination_clauses_included` | never (no field carries it) | Insufficient Data |

mod expiration;
mod financial;
mod parties;
mod termination;

pub use expiration::ExpirationDateRule;
pub use financial::FinancialTermsRule;
pub use parties::MinTwoPartiesRule;
pub use termination::TerminationClausesRule;

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::record::ContractRecord;
use crate::types::{BreachStatus, BreachVerdict};

/// Errors building a rule set.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("Duplicate rule ID: {0}")]
    DuplicateId(String),

    #[error("Rule set is empty")]
    Empty,
}

/// A static compliance rule evaluated against contract records.
///
/// Implementations must be pure: the same record always produces the same
/// status and details.
pub trait BreachRule: Send + Sync {
    /// Unique identifier (e.g., "min_two_parties")
    fn id(&self) -> &'static str;

    /// Human-readable statement of the rule
    fn description(&self) -> &'static str;

    /// Decide the status and explain it.
    fn check(&self, record: &ContractRecord) -> (BreachStatus, String);

    /// Evaluate the rule into a verdict.
    fn evaluate(&self, record: &ContractRecord) -> BreachVerdict {
        let (status, details) = self.check(record);
        BreachVerdict {
            rule_id: self.id().to_string(),
            rule_description: self.description().to_string(),
            status,
            details,
        }
    }
}

/// An ordered, read-only collection of rules with unique ids.
pub struct RuleSet {
    rules: Vec<Box<dyn BreachRule>>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate ids.
    pub fn new(rules: Vec<Box<dyn BreachRule>>) -> Result<Self, RuleSetError> {
        if rules.is_empty() {
            return Err(RuleSetError::Empty);
        }

        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id()) {
                return Err(RuleSetError::DuplicateId(rule.id().to_string()));
            }
        }

        Ok(Self { rules })
    }

    /// The fixed rule set, in declaration order.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                Box::new(ExpirationDateRule),
                Box::new(MinTwoPartiesRule),
                Box::new(FinancialTermsRule),
                Box::new(TerminationClausesRule),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn BreachRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule ids in declaration order.
    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// `(id, description)` pairs, the shape embedded in prompts.
    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.description())).collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysMet(&'static str);

    impl BreachRule for AlwaysMet {
        fn id(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "Always met"
        }

        fn check(&self, _record: &ContractRecord) -> (BreachStatus, String) {
            (BreachStatus::Met, "ok".to_string())
        }
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            RuleSet::standard().ids(),
            vec![
                "expiration_date_exists",
                "min_two_parties",
                "financial_terms_specified",
                "termination_clauses_included",
            ]
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = RuleSet::new(vec![Box::new(AlwaysMet("r1")), Box::new(AlwaysMet("r1"))]);
        assert_eq!(result.unwrap_err(), RuleSetError::DuplicateId("r1".to_string()));
    }

    #[test]
    fn test_empty_rule_set_rejected() {
        assert_eq!(RuleSet::new(vec![]).unwrap_err(), RuleSetError::Empty);
    }

    #[test]
    fn test_default_evaluate_builds_verdict() {
        let verdict = AlwaysMet("custom").evaluate(&ContractRecord::new());
        assert_eq!(verdict.rule_id, "custom");
        assert_eq!(verdict.rule_description, "Always met");
        assert_eq!(verdict.status, BreachStatus::Met);
    }
}
