//! Contract record parsing from YAML/JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_record_schema;

/// Errors that can occur when parsing contract records.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to read record file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Record does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Record schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("Record validation failed: {0}")]
    ValidationError(String),
}

/// A party to the contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Party {
    /// Legal name of the party
    pub name: String,

    /// Role in the contract (e.g., "Provider", "Client")
    #[serde(default, deserialize_with = "non_blank::deserialize")]
    pub role: Option<String>,

    /// Postal address
    #[serde(default, deserialize_with = "non_blank::deserialize")]
    pub address: Option<String>,

    /// Contact (email, phone or person)
    #[serde(default, deserialize_with = "non_blank::deserialize")]
    pub contact: Option<String>,
}

impl Party {
    /// Create a party with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            address: None,
            contact: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the contact.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }
}

/// Structured data extracted from one contract document.
///
/// Created once per uploaded document and never mutated afterwards; breach
/// verdicts and penalty estimates are always derived fresh from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractRecord {
    /// Date the contract takes effect
    #[serde(default, deserialize_with = "optional_date::deserialize")]
    pub effective_date: Option<NaiveDate>,

    /// Date the contract expires
    #[serde(default, deserialize_with = "optional_date::deserialize")]
    pub expiration_date: Option<NaiveDate>,

    /// Parties in the order they appear in the document
    #[serde(default, deserialize_with = "null_as_empty::deserialize")]
    pub parties: Vec<Party>,

    /// Free-text description of payment obligations
    #[serde(default, deserialize_with = "non_blank::deserialize")]
    pub financial_terms: Option<String>,

    /// Governing law / jurisdiction
    #[serde(default, deserialize_with = "non_blank::deserialize")]
    pub governing_law: Option<String>,
}

impl ContractRecord {
    /// Create an empty record (every field absent).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_effective_date(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }

    pub fn with_expiration_date(mut self, date: NaiveDate) -> Self {
        self.expiration_date = Some(date);
        self
    }

    pub fn with_party(mut self, party: Party) -> Self {
        self.parties.push(party);
        self
    }

    pub fn with_financial_terms(mut self, terms: impl Into<String>) -> Self {
        self.financial_terms = Some(terms.into());
        self
    }

    pub fn with_governing_law(mut self, law: impl Into<String>) -> Self {
        self.governing_law = Some(law.into());
        self
    }

    /// Build a record from an untyped JSON value (e.g., model output).
    ///
    /// The value is checked against the record schema first, so a malformed
    /// value never yields a partially populated record.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        validate_record_schema(&value)?;
        let record: ContractRecord = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }

    /// Parse a record from JSON string.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a record from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a record from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a record from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a record file, choosing the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_json_file(path),
        }
    }

    /// Serialize the record as pretty JSON, the shape prompts embed.
    pub fn to_json_pretty(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate cross-field structure.
    fn validate(&self) -> Result<(), RecordError> {
        if let Some(index) = self.parties.iter().position(|p| p.name.trim().is_empty()) {
            return Err(RecordError::ValidationError(format!(
                "parties[{}].name is empty",
                index
            )));
        }

        Ok(())
    }
}

/// Blank strings from the model are treated as absent values.
mod non_blank {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }
}

mod null_as_empty {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// ISO `YYYY-MM-DD` dates; null or blank means absent, anything else is an error.
mod optional_date {
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid date '{}': {}", s, e))),
        }
    }
}
