//! Plain-text rendering of pipeline results for the user.

use std::fmt::Write;

use crate::penalty::overall_notes;
use crate::record::ContractRecord;
use crate::types::{BreachStatus, BreachVerdict, PenaltyEstimate};

const NOT_FOUND: &str = "(not found)";

/// Render the extracted record under "Extracted Contract Data".
pub fn render_record(record: &ContractRecord) -> String {
    let mut out = String::from("Extracted Contract Data\n");

    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| NOT_FOUND.to_string())
    };

    let _ = writeln!(out, "  Effective date:  {}", date(record.effective_date));
    let _ = writeln!(out, "  Expiration date: {}", date(record.expiration_date));

    if record.parties.is_empty() {
        let _ = writeln!(out, "  Parties:         {}", NOT_FOUND);
    } else {
        let _ = writeln!(out, "  Parties:");
        for party in &record.parties {
            let _ = write!(out, "    - {}", party.name);
            if let Some(role) = &party.role {
                let _ = write!(out, " ({})", role);
            }
            out.push('\n');
            if let Some(address) = &party.address {
                let _ = writeln!(out, "      Address: {}", address);
            }
            if let Some(contact) = &party.contact {
                let _ = writeln!(out, "      Contact: {}", contact);
            }
        }
    }

    let _ = writeln!(
        out,
        "  Financial terms: {}",
        record.financial_terms.as_deref().unwrap_or(NOT_FOUND)
    );
    let _ = writeln!(
        out,
        "  Governing law:   {}",
        record.governing_law.as_deref().unwrap_or(NOT_FOUND)
    );

    out
}

/// Render verdicts under "Possible Breaches".
pub fn render_verdicts(verdicts: &[BreachVerdict]) -> String {
    let mut out = String::from("Possible Breaches\n");

    for verdict in verdicts {
        let marker = match verdict.status {
            BreachStatus::Met => "[ok]",
            BreachStatus::NotMet => "[!!]",
            BreachStatus::InsufficientData => "[??]",
        };
        let _ = writeln!(
            out,
            "  {} {}: {}",
            marker, verdict.rule_id, verdict.status
        );
        let _ = writeln!(out, "       {}", verdict.rule_description);
        let _ = writeln!(out, "       {}", verdict.details);
    }

    if !verdicts.iter().any(|v| v.status.is_not_met()) {
        out.push_str("  No breaches identified.\n");
    }

    out
}

/// Render estimates under "Possible Penalties".
pub fn render_penalties(estimates: &[PenaltyEstimate]) -> String {
    let mut out = String::from("Possible Penalties\n");

    if estimates.is_empty() {
        out.push_str("  No penalties identified.\n");
        return out;
    }

    for (i, estimate) in estimates.iter().enumerate() {
        let _ = write!(out, "  {}. {}", i + 1, estimate.clause_label);
        if let Some(rule) = &estimate.related_rule {
            let _ = write!(out, " [rule: {}]", rule);
        }
        out.push('\n');
        let _ = writeln!(out, "     {}", estimate.description);
        let _ = writeln!(out, "     Amount:  {}", estimate.amount_formula);
        let _ = writeln!(out, "     Trigger: {}", estimate.trigger_condition);
        let _ = writeln!(out, "     Notes:   {}", estimate.notes);
    }

    let _ = write!(out, "\n  Overall: {}\n", overall_notes(estimates));
    out
}
