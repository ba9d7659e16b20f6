//! Contract record parsing and validation.
//!
//! A `ContractRecord` is the normalized structured data extracted from a
//! contract document. Records coming from a model are validated against
//! `schema/contract_record.schema.json` before they are deserialized.

mod parser;
mod schema;

pub use parser::{ContractRecord, Party, RecordError};
pub use schema::validate_record_schema;
