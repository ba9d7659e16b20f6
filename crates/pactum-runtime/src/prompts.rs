//! Prompts for the contract analysis model calls.
//!
//! Extraction is the only call whose output feeds the pipeline. The two
//! commentary prompts receive results that are already final and ask the
//! model only to explain them.

use pactum_core::{BreachVerdict, ContractRecord, PenaltyEstimate};

/// System prompt shared by every call.
pub const SYSTEM_PROMPT: &str = r#"
You are a contract analysis assistant for legal professionals.

You read contracts and report what they say. You do not give legal advice.
You never invent dates, parties, or amounts. If a value is not stated in the
document, report it as missing.
"#;

/// Extraction instructions sent with the contract document.
pub const EXTRACTION_PROMPT: &str = r#"
## Task: Contract Data Extraction

The attached document is a contract. Read all of it, including scanned pages.

1. Transcribe the full contract text.
2. Extract the key data points listed below.
3. Assess how completely and accurately you could extract them. Note any
   ambiguities or missing information.
4. Summarize the contract's main purpose and key terms in a few sentences.

Key data points:
- Effective date and expiration date (YYYY-MM-DD)
- Involved parties: name, role, address, contact
- Financial amounts and terms, quoted as written including currency and period
- Governing law

## Output Format (JSON only, no prose)
{
  "structured_data": {
    "effective_date": "YYYY-MM-DD" | null,
    "expiration_date": "YYYY-MM-DD" | null,
    "parties": [{ "name": "", "role": "", "address": "", "contact": "" }],
    "financial_terms": "" | null,
    "governing_law": "" | null
  },
  "extracted_text": "full contract text",
  "data_quality_assessment": "...",
  "summary": "..."
}

## Rules
- Use null for any value the contract does not state.
- Dates must be ISO 8601 calendar dates. Do not guess a day or month.
- List every party in the order the contract names them.
"#;

/// Commentary on breach verdicts already computed by the rule set.
pub const BREACH_COMMENTARY_PROMPT: &str = r#"
## Task: Explain Breach Findings

Below are the extracted contract data and the verdict of each breach rule.
The verdicts are final. Do not change, add, or remove any verdict.

Write a short explanation (at most five sentences) for the user:
- what each "Not Met" verdict means in practice,
- what information would resolve each "Insufficient Data" verdict.

If no rule is "Not Met", say clearly that no breaches were identified.
Reply in plain text.
"#;

/// Commentary on penalty estimates already computed from the record.
pub const PENALTY_COMMENTARY_PROMPT: &str = r#"
## Task: Explain Penalty Estimates

Below are the extracted contract data, the breach verdicts if any, and the
penalty estimates. The estimates are final. Do not change any amount or add
new penalties.

Write a short explanation (at most five sentences) for the user about when
each penalty would apply and what the contract leaves ambiguous.

If no penalty is quantifiable, say so clearly.
Reply in plain text.
"#;

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// User prompt for breach commentary.
pub fn breach_commentary(
    record: &ContractRecord,
    verdicts: &[BreachVerdict],
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "{}\n## Extracted Contract Data\n{}\n\n## Breach Verdicts\n{}\n",
        BREACH_COMMENTARY_PROMPT,
        to_json(record)?,
        to_json(verdicts)?
    ))
}

/// User prompt for penalty commentary.
pub fn penalty_commentary(
    record: &ContractRecord,
    verdicts: Option<&[BreachVerdict]>,
    estimates: &[PenaltyEstimate],
) -> Result<String, serde_json::Error> {
    let verdict_section = match verdicts {
        Some(verdicts) => to_json(verdicts)?,
        None => "No breach report was provided.".to_string(),
    };

    Ok(format!(
        "{}\n## Extracted Contract Data\n{}\n\n## Breach Verdicts\n{}\n\n## Penalty Estimates\n{}\n",
        PENALTY_COMMENTARY_PROMPT,
        to_json(record)?,
        verdict_section,
        to_json(estimates)?
    ))
}
