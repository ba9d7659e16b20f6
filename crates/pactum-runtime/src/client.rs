//! Language model capability used by the pipeline.
//!
//! `LanguageModelClient` has one method per stage prompt. Only `extract`
//! produces data the pipeline depends on; the annotate methods add optional
//! commentary to results that are already final.

use async_trait::async_trait;
use lazy_static::lazy_static;
use pactum_core::{BreachVerdict, ContractRecord, PenaltyEstimate, RecordError};
use parking_lot::Mutex;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AnalyzerConfig;
use crate::document::Document;
use crate::prompts;
use crate::providers::{
    create_provider, ChatMessage, CompletionConfig, LlmProvider, ProviderError,
};
use crate::usage::LlmUsage;

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").unwrap();
}

const NO_QUALITY_NOTE: &str = "No data quality assessment was provided.";

/// Errors from the model client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("model reply is not a valid extraction: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("{0}")]
    Internal(String),
}

/// What the model extracted from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResponse {
    pub extracted_text: String,
    pub record: ContractRecord,
    pub quality_note: String,
    pub summary: Option<String>,
}

/// Model capability behind every pipeline stage prompt.
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    /// Read the document and return its text, record and quality note.
    async fn extract(&self, document: &Document) -> Result<ExtractionResponse, ClientError>;

    /// Optional commentary on computed breach verdicts.
    async fn annotate_breaches(
        &self,
        _record: &ContractRecord,
        _verdicts: &[BreachVerdict],
    ) -> Result<Option<String>, ClientError> {
        Ok(None)
    }

    /// Optional commentary on computed penalty estimates.
    async fn annotate_penalties(
        &self,
        _record: &ContractRecord,
        _verdicts: Option<&[BreachVerdict]>,
        _estimates: &[PenaltyEstimate],
    ) -> Result<Option<String>, ClientError> {
        Ok(None)
    }

    fn name(&self) -> &str;
}

/// `LanguageModelClient` over any `LlmProvider`.
pub struct ModelClient {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    annotate: bool,
    usage: Mutex<LlmUsage>,
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("provider", &self.provider.name())
            .field("model", &self.completion.model)
            .field("annotate", &self.annotate)
            .finish()
    }
}

impl ModelClient {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
            annotate: true,
            usage: Mutex::new(LlmUsage::default()),
        }
    }

    /// Build the configured provider and wrap it.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, ProviderError> {
        let provider = create_provider(&config.provider)?;
        Ok(Self::new(provider, config.completion_config()).with_annotations(config.annotate))
    }

    /// Enable or disable the commentary calls.
    pub fn with_annotations(mut self, enabled: bool) -> Self {
        self.annotate = enabled;
        self
    }

    /// Usage accumulated over every call so far.
    pub fn usage(&self) -> LlmUsage {
        self.usage.lock().clone()
    }

    /// Provider-side estimate over the text parts of a prompt.
    fn estimate_prompt_tokens(&self, messages: &[ChatMessage]) -> u32 {
        messages
            .iter()
            .map(|m| self.provider.estimate_tokens(&m.content))
            .fold(0u32, u32::saturating_add)
    }

    async fn call(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<String, ClientError> {
        tracing::debug!(
            provider = self.provider.name(),
            model = %config.model,
            estimated_prompt_tokens = self.estimate_prompt_tokens(&messages),
            "Calling model"
        );

        let response = self.provider.complete(messages, config).await?;
        self.usage.lock().add(&response.usage, &response.model);

        tracing::debug!(
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Model replied"
        );
        Ok(response.content)
    }

    async fn commentary(&self, prompt: String) -> Result<Option<String>, ClientError> {
        if !self.annotate {
            return Ok(None);
        }
        let messages = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let text = self.call(messages, &self.completion).await?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

#[async_trait]
impl LanguageModelClient for ModelClient {
    async fn extract(&self, document: &Document) -> Result<ExtractionResponse, ClientError> {
        let messages = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompts::EXTRACTION_PROMPT).with_attachment(document.attachment()),
        ];
        let config = self.completion.clone().json();

        let content = self.call(messages, &config).await?;
        parse_extraction(&content)
    }

    async fn annotate_breaches(
        &self,
        record: &ContractRecord,
        verdicts: &[BreachVerdict],
    ) -> Result<Option<String>, ClientError> {
        let prompt = prompts::breach_commentary(record, verdicts)
            .map_err(|e| ClientError::Internal(e.to_string()))?;
        self.commentary(prompt).await
    }

    async fn annotate_penalties(
        &self,
        record: &ContractRecord,
        verdicts: Option<&[BreachVerdict]>,
        estimates: &[PenaltyEstimate],
    ) -> Result<Option<String>, ClientError> {
        let prompt = prompts::penalty_commentary(record, verdicts, estimates)
            .map_err(|e| ClientError::Internal(e.to_string()))?;
        self.commentary(prompt).await
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    structured_data: Option<serde_json::Value>,
    #[serde(default)]
    extracted_text: Option<String>,
    #[serde(default)]
    data_quality_assessment: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

fn strip_code_fence(text: &str) -> &str {
    CODE_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| text.trim())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the model's extraction reply into a validated response.
pub fn parse_extraction(content: &str) -> Result<ExtractionResponse, ClientError> {
    let raw: RawExtraction = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

    let structured = raw
        .structured_data
        .filter(|v| !v.is_null())
        .ok_or_else(|| ClientError::InvalidResponse("missing structured_data".to_string()))?;

    let extracted_text = non_blank(raw.extracted_text)
        .ok_or_else(|| ClientError::InvalidResponse("no contract text was extracted".to_string()))?;

    let record = ContractRecord::from_value(structured)?;

    Ok(ExtractionResponse {
        extracted_text,
        record,
        quality_note: non_blank(raw.data_quality_assessment)
            .unwrap_or_else(|| NO_QUALITY_NOTE.to_string()),
        summary: non_blank(raw.summary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionResponse, ResponseFormat, TokenUsage};
    use chrono::NaiveDate;
    use pactum_core::evaluate_breaches;
    use std::collections::VecDeque;

    /// Provider that replays scripted replies and records what it was sent.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        seen: Mutex<Vec<(Vec<ChatMessage>, ResponseFormat)>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.seen.lock().push((messages, config.response_format));
            let reply = self
                .replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::HttpError("script exhausted".into())))?;
            Ok(CompletionResponse {
                content: reply,
                usage: TokenUsage {
                    prompt_tokens: 100,
                    completion_tokens: 20,
                    cached_tokens: 0,
                },
                model: config.model.clone(),
                stop_reason: Some("STOP".to_string()),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    const GOOD_REPLY: &str = r#"```json
{
  "structured_data": {
    "effective_date": "2025-01-01",
    "expiration_date": "2025-12-31",
    "parties": [
      {"name": "Party A Inc.", "role": "Service Provider", "address": "123 Main St", "contact": "contact@partya.com"},
      {"name": "Party B Ltd.", "role": "Client", "address": "", "contact": null}
    ],
    "financial_terms": "Client pays $10,000 USD monthly.",
    "renewal_terms": "Auto-renews yearly"
  },
  "extracted_text": "SERVICE AGREEMENT ...",
  "data_quality_assessment": "All key fields found.",
  "summary": "A one-year services agreement."
}
```"#;

    fn document() -> Document {
        Document::from_bytes("contract.pdf", b"%PDF-1.4 contract".to_vec())
    }

    #[test]
    fn test_parse_fenced_reply() {
        let response = parse_extraction(GOOD_REPLY).unwrap();
        assert_eq!(
            response.record.expiration_date,
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
        assert_eq!(response.record.parties.len(), 2);
        assert_eq!(response.record.parties[1].address, None);
        assert_eq!(response.quality_note, "All key fields found.");
        assert_eq!(response.summary.as_deref(), Some("A one-year services agreement."));
    }

    #[test]
    fn test_parse_unfenced_reply_with_defaults() {
        let response = parse_extraction(
            r#"{"structured_data": {"parties": []}, "extracted_text": "text", "summary": "  "}"#,
        )
        .unwrap();
        assert_eq!(response.record, ContractRecord::new());
        assert_eq!(response.quality_note, NO_QUALITY_NOTE);
        assert_eq!(response.summary, None);
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = parse_extraction("I could not read the document.").unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_rejects_missing_structured_data() {
        let err = parse_extraction(r#"{"extracted_text": "text"}"#).unwrap_err();
        assert!(err.to_string().contains("structured_data"));
    }

    #[test]
    fn test_parse_rejects_missing_text() {
        let err = parse_extraction(r#"{"structured_data": {}, "extracted_text": ""}"#).unwrap_err();
        assert!(err.to_string().contains("no contract text"));
    }

    #[test]
    fn test_parse_rejects_guessed_date() {
        let err = parse_extraction(
            r#"{"structured_data": {"expiration_date": "end of 2025"}, "extracted_text": "t"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Record(RecordError::SchemaError(_))));
    }

    #[test]
    fn test_prompt_token_estimate_sums_messages() {
        let provider = ScriptedProvider::new(vec![]);
        let client = ModelClient::new(provider, CompletionConfig::default());
        let messages = vec![
            ChatMessage::system("x".repeat(40)),
            ChatMessage::user("y".repeat(9)),
        ];
        assert_eq!(client.estimate_prompt_tokens(&messages), 12);
        assert_eq!(client.estimate_prompt_tokens(&[]), 0);
    }

    #[tokio::test]
    async fn test_extract_sends_document_as_json_request() {
        let provider = ScriptedProvider::new(vec![Ok(GOOD_REPLY.to_string())]);
        let client = ModelClient::new(provider.clone(), CompletionConfig::default());

        let response = client.extract(&document()).await.unwrap();
        assert_eq!(response.record.parties[0].name, "Party A Inc.");

        let seen = provider.seen.lock();
        let (messages, format) = &seen[0];
        assert_eq!(*format, ResponseFormat::Json);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].attachments.len(), 1);
        assert_eq!(messages[1].attachments[0].mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_usage_accumulates() {
        let provider = ScriptedProvider::new(vec![
            Ok(GOOD_REPLY.to_string()),
            Ok("No breaches were identified.".to_string()),
        ]);
        let client = ModelClient::new(provider, CompletionConfig::default());

        let response = client.extract(&document()).await.unwrap();
        let report = evaluate_breaches(&response.record);
        let commentary = client
            .annotate_breaches(&response.record, report.verdicts())
            .await
            .unwrap();

        assert_eq!(commentary.as_deref(), Some("No breaches were identified."));
        let usage = client.usage();
        assert_eq!(usage.llm_calls, 2);
        assert_eq!(usage.total_tokens, 240);
    }

    #[tokio::test]
    async fn test_annotations_disabled_skip_provider() {
        let provider = ScriptedProvider::new(vec![]);
        let client =
            ModelClient::new(provider.clone(), CompletionConfig::default()).with_annotations(false);

        let record = ContractRecord::new();
        let commentary = client.annotate_penalties(&record, None, &[]).await.unwrap();

        assert_eq!(commentary, None);
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::AuthError)]);
        let client = ModelClient::new(provider, CompletionConfig::default());

        let err = client.extract(&document()).await.unwrap_err();
        assert!(matches!(err, ClientError::Provider(ProviderError::AuthError)));
    }
}
