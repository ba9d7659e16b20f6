//! # pactum-core
//!
//! Deterministic core of the contract analysis pipeline.
//!
//! This crate holds the data contract between the three pipeline stages and
//! the two stages that need no model at all:
//! - `ContractRecord`: structured data extracted from a contract
//! - Breach Evaluator: fixed rule set, one verdict per rule
//! - Penalty Estimator: late-payment and breach-linked estimates
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same record always produces the same verdicts and estimates
//! 2. **No LLM calls**: Extraction lives in `pactum-runtime`
//! 3. **No guessing**: Absent fields stay absent, malformed dates are errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use pactum_core::{ContractRecord, evaluate_breaches, estimate_penalties};
//!
//! let record = ContractRecord::from_json_file("record.json")?;
//! let report = evaluate_breaches(&record);
//! let penalties = estimate_penalties(&record, Some(report.verdicts()));
//!
//! for verdict in report.verdicts() {
//!     println!("{}: {}", verdict.rule_id, verdict.status);
//! }
//! ```

pub mod breach;
pub mod penalty;
pub mod record;
pub mod render;
pub mod rules;
pub mod types;

// Re-export main types at crate root
pub use breach::{BreachEvaluator, BreachReport, VerdictCounts};
pub use penalty::{overall_notes, PenaltyEstimator, PenaltyPolicy};
pub use record::{ContractRecord, Party, RecordError};
pub use rules::{BreachRule, RuleSet, RuleSetError};
pub use types::{BreachStatus, BreachVerdict, Money, PenaltyAmount, PenaltyEstimate};

/// Evaluate a record against the standard rule set.
pub fn evaluate_breaches(record: &ContractRecord) -> BreachReport {
    BreachEvaluator::default().evaluate(record)
}

/// Estimate penalties with the default policy.
pub fn estimate_penalties(
    record: &ContractRecord,
    verdicts: Option<&[BreachVerdict]>,
) -> Vec<PenaltyEstimate> {
    PenaltyEstimator::default().estimate(record, verdicts)
}
