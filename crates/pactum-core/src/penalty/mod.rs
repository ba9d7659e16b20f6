//! Penalty Estimator.
//!
//! Derives penalty estimates from a contract record and, optionally, the
//! breach verdicts computed for it:
//!
//! 1. Every Not Met verdict contributes one estimate tied to its rule,
//!    listed first.
//! 2. A recurring payment in the financial terms yields a late-payment
//!    estimate (a percentage of the periodic amount after a grace period).
//! 3. If nothing else was produced, a single placeholder states that no
//!    quantifiable penalty was found.
//!
//! `overall_notes` summarizes a finished estimate list in one paragraph.

mod patterns;

pub use patterns::{find_recurring_payment, PaymentPeriod, RecurringPayment};

use serde::{Deserialize, Serialize};

use crate::record::ContractRecord;
use crate::types::{BreachVerdict, PenaltyAmount, PenaltyEstimate};

/// Tunable constants for late-payment estimates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PenaltyPolicy {
    /// Late fee as a fraction of the periodic amount
    #[serde(default = "default_late_fee_rate")]
    pub late_fee_rate: f64,

    /// Days after the due date before the late fee applies
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: u32,
}

fn default_late_fee_rate() -> f64 {
    0.05
}

fn default_grace_period_days() -> u32 {
    10
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            late_fee_rate: default_late_fee_rate(),
            grace_period_days: default_grace_period_days(),
        }
    }
}

impl PenaltyPolicy {
    fn rate_basis_points(&self) -> u32 {
        (self.late_fee_rate * 10_000.0).round().clamp(0.0, u32::MAX as f64) as u32
    }

    fn rate_percent_label(&self) -> String {
        let bp = self.rate_basis_points();
        if bp % 100 == 0 {
            format!("{}%", bp / 100)
        } else {
            format!("{}.{:02}%", bp / 100, bp % 100)
        }
    }
}

/// Produces penalty estimates for a record.
#[derive(Debug, Clone, Default)]
pub struct PenaltyEstimator {
    policy: PenaltyPolicy,
}

impl PenaltyEstimator {
    pub fn new(policy: PenaltyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PenaltyPolicy {
        &self.policy
    }

    /// Estimate penalties for the record.
    ///
    /// When `verdicts` is supplied, estimates for Not Met rules come first.
    pub fn estimate(
        &self,
        record: &ContractRecord,
        verdicts: Option<&[BreachVerdict]>,
    ) -> Vec<PenaltyEstimate> {
        let mut estimates: Vec<PenaltyEstimate> = verdicts
            .unwrap_or(&[])
            .iter()
            .filter(|v| v.status.is_not_met())
            .map(breach_consequence)
            .collect();

        let payment = record
            .financial_terms
            .as_deref()
            .and_then(find_recurring_payment);

        if let Some(payment) = payment {
            estimates.push(self.late_payment(&payment));
        }

        if estimates.is_empty() {
            estimates.push(no_quantifiable_penalty());
        }

        tracing::debug!(
            estimates = estimates.len(),
            with_verdicts = verdicts.is_some(),
            "Penalty estimates derived"
        );
        estimates
    }

    fn late_payment(&self, payment: &RecurringPayment) -> PenaltyEstimate {
        let period = payment.period.adjective();
        let rate = self.policy.rate_percent_label();
        let days = self.policy.grace_period_days;

        PenaltyEstimate {
            clause_label: "Late Payment".to_string(),
            description: format!(
                "A late fee of {} of the outstanding {} amount may be applied if payment is not received within {} days of the due date.",
                rate, period, days
            ),
            amount_formula: PenaltyAmount::Computed {
                amount: payment.amount.percent_bp(self.policy.rate_basis_points()),
                formula: format!("{} * {}_amount", self.policy.late_fee_rate, period),
            },
            trigger_condition: format!("Payment not received within {} days of due date.", days),
            notes: format!(
                "Assumes {} amount is {} as per financial terms.",
                period, payment.amount
            ),
            related_rule: None,
        }
    }
}

/// Consequence of a Not Met rule. Extraction data alone never quantifies these.
fn breach_consequence(verdict: &BreachVerdict) -> PenaltyEstimate {
    let (label, description, trigger, notes) = match verdict.rule_id.as_str() {
        "expiration_date_exists" => (
            "Undefined Contract Term".to_string(),
            "No expiration date was extracted; obligations, including recurring payments, may continue until the contract is terminated.".to_string(),
            "Dispute over the contract term or continued performance.".to_string(),
            "Review renewal and termination provisions before relying on an end date.".to_string(),
        ),
        "min_two_parties" => (
            "Party Identification".to_string(),
            "Fewer than two parties were extracted; penalty clauses may be unenforceable against an unidentified counterparty.".to_string(),
            "Enforcement against a party not named in the extracted data.".to_string(),
            "Confirm the counterparties before relying on any penalty estimate.".to_string(),
        ),
        _ => (
            verdict.rule_description.clone(),
            format!(
                "Rule '{}' was not met; no penalty amount is quantifiable from the extracted data.",
                verdict.rule_id
            ),
            "N/A".to_string(),
            verdict.details.clone(),
        ),
    };

    PenaltyEstimate {
        clause_label: label,
        description,
        amount_formula: PenaltyAmount::NotApplicable,
        trigger_condition: trigger,
        notes,
        related_rule: Some(verdict.rule_id.clone()),
    }
}

/// General observations over a list of estimates.
pub fn overall_notes(estimates: &[PenaltyEstimate]) -> String {
    let breach_linked = estimates.iter().filter(|e| e.related_rule.is_some()).count();
    let computed = estimates
        .iter()
        .filter(|e| matches!(e.amount_formula, PenaltyAmount::Computed { .. }))
        .count();

    let mut notes = Vec::new();
    if computed > 0 {
        notes.push(
            "Computed amounts are derived from the extracted financial terms and should be checked against the contract's penalty clauses.".to_string(),
        );
    }
    if breach_linked > 0 {
        notes.push(format!(
            "{} estimate{} follow{} from unmet breach rules and cannot be quantified until the missing terms are confirmed.",
            breach_linked,
            if breach_linked == 1 { "" } else { "s" },
            if breach_linked == 1 { "s" } else { "" },
        ));
    }
    if notes.is_empty() {
        notes.push(
            "No penalty could be quantified from the extracted data; remedies may rest on dispute resolution provisions.".to_string(),
        );
    }
    notes.push("Further review of the penalty provisions by counsel is advised.".to_string());

    notes.join(" ")
}

fn no_quantifiable_penalty() -> PenaltyEstimate {
    PenaltyEstimate {
        clause_label: "General Non-compliance".to_string(),
        description: "No specific penalty clauses for general non-compliance were automatically quantifiable from the text.".to_string(),
        amount_formula: PenaltyAmount::NotApplicable,
        trigger_condition: "N/A".to_string(),
        notes: "Contract may refer to dispute resolution or other remedies.".to_string(),
        related_rule: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breach::BreachEvaluator;
    use crate::record::Party;
    use crate::types::Money;
    use chrono::NaiveDate;

    fn scenario_full() -> ContractRecord {
        ContractRecord::new()
            .with_expiration_date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())
            .with_party(Party::named("Party A Inc."))
            .with_party(Party::named("Party B Ltd."))
            .with_financial_terms("Client pays $10,000 USD monthly.")
    }

    #[test]
    fn test_late_payment_from_monthly_terms() {
        let estimates = PenaltyEstimator::default().estimate(&scenario_full(), None);
        assert_eq!(estimates.len(), 1);

        let late = &estimates[0];
        assert_eq!(late.clause_label, "Late Payment");
        assert_eq!(
            late.trigger_condition,
            "Payment not received within 10 days of due date."
        );
        match &late.amount_formula {
            PenaltyAmount::Computed { amount, formula } => {
                assert_eq!(*amount, Money::new(50_000, "USD"));
                assert_eq!(formula, "0.05 * monthly_amount");
            }
            other => panic!("expected computed amount, got {:?}", other),
        }
        assert!(late.description.contains("5% of the outstanding monthly amount"));
        assert!(late.notes.contains("10,000.00 USD"));
    }

    #[test]
    fn test_placeholder_for_empty_record() {
        let estimates = PenaltyEstimator::default().estimate(&ContractRecord::new(), None);
        assert_eq!(estimates, vec![no_quantifiable_penalty()]);
    }

    #[test]
    fn test_placeholder_for_unmatched_terms() {
        let record = ContractRecord::new().with_financial_terms("Fees as agreed in writing.");
        let estimates = PenaltyEstimator::default().estimate(&record, None);
        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].clause_label, "General Non-compliance");
    }

    #[test]
    fn test_not_met_verdicts_come_first() {
        let record = ContractRecord::new().with_financial_terms("Client pays $2,000 weekly.");
        let report = BreachEvaluator::default().evaluate(&record);

        let estimates = PenaltyEstimator::default().estimate(&record, Some(report.verdicts()));
        let related: Vec<Option<&str>> = estimates.iter().map(|e| e.related_rule.as_deref()).collect();
        assert_eq!(
            related,
            vec![Some("expiration_date_exists"), Some("min_two_parties"), None]
        );
        assert_eq!(estimates[2].clause_label, "Late Payment");
    }

    #[test]
    fn test_no_placeholder_when_breaches_present() {
        let record = ContractRecord::new();
        let report = BreachEvaluator::default().evaluate(&record);

        let estimates = PenaltyEstimator::default().estimate(&record, Some(report.verdicts()));
        assert_eq!(estimates.len(), 2);
        assert!(estimates.iter().all(|e| e.amount_formula == PenaltyAmount::NotApplicable));
    }

    #[test]
    fn test_all_met_verdicts_match_base_policy() {
        let record = scenario_full();
        let report = BreachEvaluator::default().evaluate(&record);
        let estimator = PenaltyEstimator::default();

        assert_eq!(
            estimator.estimate(&record, Some(report.verdicts())),
            estimator.estimate(&record, None)
        );
    }

    #[test]
    fn test_custom_rule_consequence_uses_verdict_text() {
        let verdict = BreachVerdict {
            rule_id: "governing_law_named".to_string(),
            rule_description: "Contract should name its governing law.".to_string(),
            status: crate::types::BreachStatus::NotMet,
            details: "No governing law extracted.".to_string(),
        };
        let estimate = breach_consequence(&verdict);
        assert_eq!(estimate.clause_label, "Contract should name its governing law.");
        assert_eq!(estimate.notes, "No governing law extracted.");
        assert_eq!(estimate.related_rule.as_deref(), Some("governing_law_named"));
    }

    #[test]
    fn test_overall_notes_for_late_payment() {
        let estimates = PenaltyEstimator::default().estimate(&scenario_full(), None);
        let notes = overall_notes(&estimates);
        assert!(notes.starts_with("Computed amounts are derived"));
        assert!(!notes.contains("unmet breach rules"));
        assert!(notes.ends_with("by counsel is advised."));
    }

    #[test]
    fn test_overall_notes_count_breach_estimates() {
        let record = ContractRecord::new();
        let report = BreachEvaluator::default().evaluate(&record);
        let estimates = PenaltyEstimator::default().estimate(&record, Some(report.verdicts()));

        let notes = overall_notes(&estimates);
        assert!(notes.contains("2 estimates follow from unmet breach rules"));
        assert!(!notes.contains("Computed amounts"));
    }

    #[test]
    fn test_overall_notes_for_placeholder() {
        let notes = overall_notes(&[no_quantifiable_penalty()]);
        assert!(notes.starts_with("No penalty could be quantified"));
    }

    #[test]
    fn test_custom_policy() {
        let estimator = PenaltyEstimator::new(PenaltyPolicy {
            late_fee_rate: 0.015,
            grace_period_days: 5,
        });
        let record = ContractRecord::new().with_financial_terms("EUR 4,000 per month");
        let late = &estimator.estimate(&record, None)[0];

        assert!(late.description.contains("1.50%"));
        assert_eq!(late.trigger_condition, "Payment not received within 5 days of due date.");
        match &late.amount_formula {
            PenaltyAmount::Computed { amount, .. } => assert_eq!(*amount, Money::new(6_000, "EUR")),
            other => panic!("expected computed amount, got {:?}", other),
        }
    }
}
