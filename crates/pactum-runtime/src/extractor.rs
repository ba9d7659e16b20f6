//! Document Extractor.
//!
//! Resolves a document reference, hands the document to the language model
//! and validates what comes back. Every failure is converted to a
//! `StageError` here so the orchestrator never sees provider details.

use chrono::{DateTime, Utc};
use pactum_core::render::render_record;
use pactum_core::ContractRecord;
use serde::Serialize;
use std::sync::Arc;

use crate::client::{ClientError, LanguageModelClient};
use crate::document;
use crate::error::StageError;

/// Result of extracting one contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    /// The reference the user supplied
    pub document: String,
    pub mime_type: String,
    pub extracted_text: String,
    pub record: ContractRecord,
    pub quality_note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

impl Extraction {
    /// Summary, record and quality note as user-facing text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(summary) = &self.summary {
            out.push_str("Summary\n  ");
            out.push_str(summary);
            out.push_str("\n\n");
        }
        out.push_str(&render_record(&self.record));
        out.push_str("\nData Quality\n  ");
        out.push_str(&self.quality_note);
        out.push('\n');
        out
    }
}

/// First pipeline stage.
#[derive(Clone)]
pub struct DocumentExtractor {
    client: Arc<dyn LanguageModelClient>,
}

impl DocumentExtractor {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn LanguageModelClient> {
        &self.client
    }

    /// Extract a contract record from the referenced document.
    pub async fn extract(&self, reference: &str) -> Result<Extraction, StageError> {
        let document = document::resolve(reference).await.map_err(|e| {
            tracing::warn!(reference, error = %e, "Document could not be resolved");
            StageError::NotFound(e.to_string())
        })?;

        let response = self.client.extract(&document).await.map_err(|e| {
            tracing::warn!(
                reference,
                client = self.client.name(),
                error = %e,
                "Extraction failed"
            );
            match e {
                ClientError::Internal(message) => StageError::Unexpected(message),
                other => StageError::ExtractionFailed(other.to_string()),
            }
        })?;

        tracing::info!(
            reference,
            parties = response.record.parties.len(),
            has_expiration = response.record.expiration_date.is_some(),
            has_financial_terms = response.record.financial_terms.is_some(),
            text_chars = response.extracted_text.len(),
            "Contract extracted"
        );

        Ok(Extraction {
            document: document.reference().to_string(),
            mime_type: document.mime_type().to_string(),
            extracted_text: response.extracted_text,
            record: response.record,
            quality_note: response.quality_note,
            summary: response.summary,
            extracted_at: Utc::now(),
        })
    }
}
