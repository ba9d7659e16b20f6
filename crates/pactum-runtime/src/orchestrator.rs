//! Conversation orchestrator.
//!
//! Drives the three stages in order, one user request at a time:
//!
//! ```text
//! AwaitingDocument -> Extracting -> AwaitingBreachRequest -> EvaluatingBreaches
//!     -> AwaitingPenaltyRequest -> EstimatingPenalties -> Idle
//! ```
//!
//! Transitions only happen on user requests. A failed stage leaves the
//! conversation in the state it was in before the request, and the failure
//! message is relayed to the user verbatim.

use pactum_core::render::{render_penalties, render_verdicts};
use pactum_core::{
    overall_notes, BreachEvaluator, BreachReport, ContractRecord, PenaltyEstimate,
    PenaltyEstimator, PenaltyPolicy, RuleSet,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::client::LanguageModelClient;
use crate::config::AnalyzerConfig;
use crate::error::{ErrorKind, StageError};
use crate::extractor::{DocumentExtractor, Extraction};

/// Where a conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    AwaitingDocument,
    Extracting,
    AwaitingBreachRequest,
    EvaluatingBreaches,
    AwaitingPenaltyRequest,
    EstimatingPenalties,
    Idle,
}

impl ConversationState {
    /// States a conversation can rest in between requests.
    pub fn is_resting(&self) -> bool {
        !matches!(
            self,
            ConversationState::Extracting
                | ConversationState::EvaluatingBreaches
                | ConversationState::EstimatingPenalties
        )
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversationState::AwaitingDocument => "awaiting document",
            ConversationState::Extracting => "extracting",
            ConversationState::AwaitingBreachRequest => "awaiting breach request",
            ConversationState::EvaluatingBreaches => "evaluating breaches",
            ConversationState::AwaitingPenaltyRequest => "awaiting penalty request",
            ConversationState::EstimatingPenalties => "estimating penalties",
            ConversationState::Idle => "idle",
        };
        f.write_str(name)
    }
}

/// A user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    SubmitDocument(String),
    DetectBreaches,
    EstimatePenalties,
    Reset,
}

/// The orchestrator's answer to one request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Extracted {
        extraction: Extraction,
    },
    Breaches {
        verdicts: BreachReport,
        #[serde(skip_serializing_if = "Option::is_none")]
        commentary: Option<String>,
    },
    Penalties {
        estimates: Vec<PenaltyEstimate>,
        overall_notes: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        commentary: Option<String>,
    },
    Reset,
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl Reply {
    pub fn failed(error: &StageError) -> Self {
        Reply::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failed { .. })
    }

    /// What the user can do next.
    pub fn next_hint(&self) -> Option<&'static str> {
        match self {
            Reply::Extracted { .. } => {
                Some("You can now request breach detection or penalty calculation.")
            }
            Reply::Breaches { .. } => Some("You can now request penalty calculation."),
            Reply::Penalties { .. } => {
                Some("Upload another contract or ask again for breaches or penalties.")
            }
            Reply::Reset => Some("Please upload a contract PDF to begin."),
            Reply::Failed {
                kind: ErrorKind::MissingInput,
                ..
            } => None,
            Reply::Failed { .. } => Some("Please try again."),
        }
    }

    /// User-facing text, ending with the next-action hint.
    pub fn render(&self) -> String {
        let mut out = match self {
            Reply::Extracted { extraction } => extraction.render(),
            Reply::Breaches {
                verdicts,
                commentary,
            } => with_commentary(render_verdicts(verdicts.verdicts()), commentary),
            Reply::Penalties {
                estimates,
                commentary,
                ..
            } => with_commentary(render_penalties(estimates), commentary),
            Reply::Reset => "Conversation reset.\n".to_string(),
            Reply::Failed { message, .. } => format!("{}\n", message),
        };

        if let Some(hint) = self.next_hint() {
            out.push('\n');
            out.push_str(hint);
            out.push('\n');
        }
        out
    }
}

fn with_commentary(mut text: String, commentary: &Option<String>) -> String {
    if let Some(commentary) = commentary {
        text.push('\n');
        text.push_str(commentary);
        text.push('\n');
    }
    text
}

/// Stage components shared read-only by every conversation.
pub struct Pipeline {
    extractor: DocumentExtractor,
    evaluator: BreachEvaluator,
    estimator: PenaltyEstimator,
}

impl Pipeline {
    /// Standard rules and default penalty policy.
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self::builder(client).build()
    }

    pub fn builder(client: Arc<dyn LanguageModelClient>) -> PipelineBuilder {
        PipelineBuilder::new(client)
    }

    pub fn from_config(client: Arc<dyn LanguageModelClient>, config: &AnalyzerConfig) -> Self {
        Self::builder(client)
            .penalty_policy(config.penalty.clone())
            .build()
    }

    pub fn client(&self) -> &Arc<dyn LanguageModelClient> {
        self.extractor.client()
    }

    pub fn evaluator(&self) -> &BreachEvaluator {
        &self.evaluator
    }

    pub fn estimator(&self) -> &PenaltyEstimator {
        &self.estimator
    }
}

/// Builder for `Pipeline`.
pub struct PipelineBuilder {
    client: Arc<dyn LanguageModelClient>,
    rules: Option<Arc<RuleSet>>,
    policy: PenaltyPolicy,
}

impl PipelineBuilder {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self {
            client,
            rules: None,
            policy: PenaltyPolicy::default(),
        }
    }

    pub fn rules(mut self, rules: Arc<RuleSet>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn penalty_policy(mut self, policy: PenaltyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Pipeline {
        let evaluator = match self.rules {
            Some(rules) => BreachEvaluator::new(rules),
            None => BreachEvaluator::default(),
        };
        Pipeline {
            extractor: DocumentExtractor::new(self.client),
            evaluator,
            estimator: PenaltyEstimator::new(self.policy),
        }
    }
}

/// One user's conversation with the analyzer.
pub struct Conversation {
    pipeline: Arc<Pipeline>,
    state: ConversationState,
    /// Last resting state, restored if a request is abandoned mid-stage
    resting: ConversationState,
    extraction: Option<Extraction>,
    report: Option<BreachReport>,
    estimates: Option<Vec<PenaltyEstimate>>,
}

impl Conversation {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            state: ConversationState::AwaitingDocument,
            resting: ConversationState::AwaitingDocument,
            extraction: None,
            report: None,
            estimates: None,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn extraction(&self) -> Option<&Extraction> {
        self.extraction.as_ref()
    }

    pub fn record(&self) -> Option<&ContractRecord> {
        self.extraction.as_ref().map(|e| &e.record)
    }

    pub fn report(&self) -> Option<&BreachReport> {
        self.report.as_ref()
    }

    pub fn estimates(&self) -> Option<&[PenaltyEstimate]> {
        self.estimates.as_deref()
    }

    /// Handle one request. Failures become `Reply::Failed`.
    pub async fn handle(&mut self, request: Request) -> Reply {
        let result = match request {
            Request::SubmitDocument(reference) => self
                .submit_document(&reference)
                .await
                .map(|extraction| Reply::Extracted { extraction }),
            Request::DetectBreaches => {
                self.detect_breaches()
                    .await
                    .map(|(verdicts, commentary)| Reply::Breaches {
                        verdicts,
                        commentary,
                    })
            }
            Request::EstimatePenalties => {
                self.estimate_penalties()
                    .await
                    .map(|(estimates, commentary)| Reply::Penalties {
                        overall_notes: overall_notes(&estimates),
                        estimates,
                        commentary,
                    })
            }
            Request::Reset => {
                self.reset();
                Ok(Reply::Reset)
            }
        };

        result.unwrap_or_else(|e| Reply::failed(&e))
    }

    /// Extract a new contract, replacing any previous one.
    pub async fn submit_document(&mut self, reference: &str) -> Result<Extraction, StageError> {
        self.recover();
        self.state = ConversationState::Extracting;

        match self.pipeline.extractor.extract(reference).await {
            Ok(extraction) => {
                self.extraction = Some(extraction.clone());
                self.report = None;
                self.estimates = None;
                self.settle(ConversationState::AwaitingBreachRequest);
                Ok(extraction)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Evaluate the current record against the rule set.
    pub async fn detect_breaches(
        &mut self,
    ) -> Result<(BreachReport, Option<String>), StageError> {
        self.recover();
        let record = self.require_record()?;
        self.state = ConversationState::EvaluatingBreaches;

        let report = self.pipeline.evaluator.evaluate(&record);
        let commentary = match self
            .pipeline
            .client()
            .annotate_breaches(&record, report.verdicts())
            .await
        {
            Ok(commentary) => commentary,
            Err(e) => {
                tracing::warn!(error = %e, "Breach commentary unavailable");
                None
            }
        };

        let counts = report.counts();
        tracing::info!(
            met = counts.met,
            not_met = counts.not_met,
            insufficient_data = counts.insufficient_data,
            "Breach evaluation complete"
        );

        self.report = Some(report.clone());
        self.estimates = None;
        self.settle(ConversationState::AwaitingPenaltyRequest);
        Ok((report, commentary))
    }

    /// Estimate penalties, using the breach verdicts when present.
    pub async fn estimate_penalties(
        &mut self,
    ) -> Result<(Vec<PenaltyEstimate>, Option<String>), StageError> {
        self.recover();
        let record = self.require_record()?;
        self.state = ConversationState::EstimatingPenalties;

        let verdicts = self.report.as_ref().map(|r| r.verdicts().to_vec());
        let estimates = self.pipeline.estimator.estimate(&record, verdicts.as_deref());

        let commentary = match self
            .pipeline
            .client()
            .annotate_penalties(&record, verdicts.as_deref(), &estimates)
            .await
        {
            Ok(commentary) => commentary,
            Err(e) => {
                tracing::warn!(error = %e, "Penalty commentary unavailable");
                None
            }
        };

        tracing::info!(
            estimates = estimates.len(),
            with_verdicts = verdicts.is_some(),
            "Penalty estimation complete"
        );

        self.estimates = Some(estimates.clone());
        self.settle(ConversationState::Idle);
        Ok((estimates, commentary))
    }

    /// Discard everything and wait for a new document.
    pub fn reset(&mut self) {
        self.extraction = None;
        self.report = None;
        self.estimates = None;
        self.settle(ConversationState::AwaitingDocument);
        tracing::debug!("Conversation reset");
    }

    fn require_record(&self) -> Result<ContractRecord, StageError> {
        self.record().cloned().ok_or_else(|| {
            tracing::warn!(state = %self.state, "Stage requested before a contract was processed");
            StageError::no_contract()
        })
    }

    fn settle(&mut self, state: ConversationState) {
        self.state = state;
        self.resting = state;
    }

    fn fail(&mut self, error: &StageError) {
        tracing::warn!(
            kind = %error.kind(),
            state = %self.resting,
            "Stage failed, keeping previous state"
        );
        self.state = self.resting;
    }

    // A request dropped mid-stage leaves a transient state behind.
    fn recover(&mut self) {
        if !self.state.is_resting() {
            self.state = self.resting;
        }
    }
}
