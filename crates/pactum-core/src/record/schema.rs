//! Record shape check for untyped model output.
//!
//! The JSON Schema in `schema/contract_record.schema.json` is embedded at
//! build time and compiled on first use. Every violation is reported, not
//! just the first, so a rejected extraction can be diagnosed from the log.

use lazy_static::lazy_static;
use serde_json::Value;

use super::parser::RecordError;

const RECORD_SCHEMA: &str = include_str!("../../../../schema/contract_record.schema.json");

lazy_static! {
    static ref RECORD_VALIDATOR: Result<jsonschema::Validator, String> = compile(RECORD_SCHEMA);
}

fn compile(source: &str) -> Result<jsonschema::Validator, String> {
    let schema: Value =
        serde_json::from_str(source).map_err(|e| format!("schema is not JSON: {}", e))?;
    jsonschema::options()
        .build(&schema)
        .map_err(|e| format!("schema does not compile: {}", e))
}

/// Check a record value against the embedded schema.
///
/// Violations come back as `"<message> at <instance path>"` inside
/// `RecordError::SchemaError`.
pub fn validate_record_schema(value: &Value) -> Result<(), RecordError> {
    let validator = RECORD_VALIDATOR
        .as_ref()
        .map_err(|e| RecordError::SchemaUnavailable(e.clone()))?;

    let violations: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(RecordError::SchemaError(violations))
    }
}
