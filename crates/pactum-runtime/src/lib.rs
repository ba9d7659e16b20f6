//! # pactum-runtime
//!
//! Model-backed extraction and conversation orchestration for Pactum.
//!
//! `pactum-core` owns the deterministic stages (breach rules, penalty
//! estimates). This crate adds everything that needs I/O:
//!
//! - resolving a document reference to bytes
//! - the Document Extractor, which asks a language model for a `ContractRecord`
//! - the conversation state machine that sequences the three stages
//! - a session registry for many concurrent conversations
//! - provider plumbing (Gemini behind the `gemini` feature), credentials, config
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pactum_runtime::{AnalyzerConfig, Conversation, ModelClient, Pipeline, Request};
//!
//! let config = AnalyzerConfig::load(None)?;
//! let client = Arc::new(ModelClient::from_config(&config)?);
//! let pipeline = Arc::new(Pipeline::from_config(client, &config));
//!
//! let mut conversation = Conversation::new(pipeline);
//! let reply = conversation.handle(Request::SubmitDocument("contract.pdf".into())).await;
//! println!("{}", reply.render());
//! let reply = conversation.handle(Request::DetectBreaches).await;
//! println!("{}", reply.render());
//! ```

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod usage;

pub use client::{ClientError, ExtractionResponse, LanguageModelClient, ModelClient};
pub use config::{AnalyzerConfig, ConfigError};
pub use document::{Document, DocumentError};
pub use error::{ErrorKind, StageError};
pub use extractor::{DocumentExtractor, Extraction};
pub use orchestrator::{Conversation, ConversationState, Pipeline, PipelineBuilder, Reply, Request};
pub use providers::{LlmProvider, ProviderError};
pub use session::{SessionId, SessionRegistry, SharedConversation};
pub use usage::LlmUsage;
