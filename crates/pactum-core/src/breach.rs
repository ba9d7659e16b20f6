//! Breach Evaluator: runs a record through the rule set.
//!
//! Evaluation is pure. Rules run in declaration order and every rule yields
//! exactly one verdict, so identical records give identical reports.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::record::ContractRecord;
use crate::rules::RuleSet;
use crate::types::{BreachStatus, BreachVerdict};

/// Verdicts for one record, in rule declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreachReport {
    verdicts: Vec<BreachVerdict>,
}

/// Tally of verdict statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub met: usize,
    pub not_met: usize,
    pub insufficient_data: usize,
}

impl BreachReport {
    pub fn new(verdicts: Vec<BreachVerdict>) -> Self {
        Self { verdicts }
    }

    pub fn verdicts(&self) -> &[BreachVerdict] {
        &self.verdicts
    }

    pub fn into_verdicts(self) -> Vec<BreachVerdict> {
        self.verdicts
    }

    /// Look up the verdict for a rule.
    pub fn get(&self, rule_id: &str) -> Option<&BreachVerdict> {
        self.verdicts.iter().find(|v| v.rule_id == rule_id)
    }

    /// Verdicts whose rule was not met.
    pub fn not_met(&self) -> impl Iterator<Item = &BreachVerdict> {
        self.verdicts.iter().filter(|v| v.status.is_not_met())
    }

    /// True when no rule is Not Met. Insufficient Data does not count as a breach.
    pub fn has_no_breaches(&self) -> bool {
        self.not_met().next().is_none()
    }

    pub fn counts(&self) -> VerdictCounts {
        self.verdicts
            .iter()
            .fold(VerdictCounts::default(), |mut acc, v| {
                match v.status {
                    BreachStatus::Met => acc.met += 1,
                    BreachStatus::NotMet => acc.not_met += 1,
                    BreachStatus::InsufficientData => acc.insufficient_data += 1,
                }
                acc
            })
    }
}

/// Evaluates records against a shared, read-only rule set.
#[derive(Debug, Clone)]
pub struct BreachEvaluator {
    rules: Arc<RuleSet>,
}

impl BreachEvaluator {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluate every rule against the record.
    pub fn evaluate(&self, record: &ContractRecord) -> BreachReport {
        let verdicts: Vec<BreachVerdict> = self.rules.iter().map(|rule| rule.evaluate(record)).collect();

        let report = BreachReport::new(verdicts);
        let counts = report.counts();
        tracing::debug!(
            met = counts.met,
            not_met = counts.not_met,
            insufficient_data = counts.insufficient_data,
            "Breach rules evaluated"
        );
        report
    }
}

impl Default for BreachEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(RuleSet::standard()))
    }
}
