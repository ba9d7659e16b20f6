//! Analyzer configuration.
//!
//! Loaded from YAML, then overridden from `GOOGLE_*` environment variables,
//! then validated. Every section has defaults, so an empty file is a valid
//! configuration.
//!
//! ```yaml
//! app_name: LegalContractAnalysisApp
//! agent:
//!   model: gemini-2.0-flash-001
//! completion:
//!   timeout: 45s
//!   max_retries: 3
//! session:
//!   idle_timeout: 30m
//! penalty:
//!   late_fee_rate: 0.05
//!   grace_period_days: 10
//! ```

use pactum_core::PenaltyPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{CompletionConfig, ResponseFormat};

/// Overrides `agent.model`.
pub const MODEL_ENV: &str = "GOOGLE_GENAI_MODEL";
/// Overrides `provider.base_url`.
pub const BASE_URL_ENV: &str = "GOOGLE_GENAI_BASE_URL";
/// Fills `provider.api_key` when the file leaves it unset.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Shown in logs and the chat banner
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub completion: CompletionSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub penalty: PenaltyPolicy,

    /// Ask the model for commentary after breach and penalty stages
    #[serde(default = "default_true")]
    pub annotate: bool,
}

fn default_true() -> bool {
    true
}

fn default_app_name() -> String {
    "LegalContractAnalysisApp".to_string()
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            agent: AgentSettings::default(),
            provider: ProviderConfig::default(),
            completion: CompletionSettings::default(),
            session: SessionSettings::default(),
            penalty: PenaltyPolicy::default(),
            annotate: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_agent_name")]
    pub name: String,

    #[serde(default = "default_model")]
    pub model: String,
}

fn default_agent_name() -> String {
    "ContractAnalysisAgent".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash-001".to_string()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            model: default_model(),
        }
    }
}

/// Provider selection and credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    /// Falls back to `GOOGLE_API_KEY` when unset
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_provider_kind() -> String {
    "gemini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            api_key: None,
            base_url: None,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSettings {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_timeout", with = "humantime_duration")]
    pub timeout: Duration,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_retries() -> u32 {
    2
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Conversations untouched this long are discarded
    #[serde(default = "default_idle_timeout", with = "humantime_duration")]
    pub idle_timeout: Duration,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_max_sessions() -> u64 {
    1_000
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: default_idle_timeout(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Serde adapter for durations written as `30s`, `5m`, `1h 30m`.
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

impl AnalyzerConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from `path` (or defaults), apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;

        tracing::debug!(
            app = %config.app_name,
            model = %config.agent.model,
            provider = %config.provider.kind,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get(MODEL_ENV) {
            self.agent.model = model;
        }
        if let Some(url) = get(BASE_URL_ENV) {
            self.provider.base_url = Some(url);
        }
        if self.provider.api_key.is_none() {
            self.provider.api_key = get(API_KEY_ENV);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.model.trim().is_empty() {
            return Err(ConfigError::Invalid("agent.model must not be empty".into()));
        }
        if self.completion.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "completion.max_tokens must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ConfigError::Invalid(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.completion.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "completion.timeout must be positive".into(),
            ));
        }
        if self.session.idle_timeout.is_zero() || self.session.max_sessions == 0 {
            return Err(ConfigError::Invalid(
                "session.idle_timeout and session.max_sessions must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.penalty.late_fee_rate) {
            return Err(ConfigError::Invalid(
                "penalty.late_fee_rate must be a fraction between 0 and 1".into(),
            ));
        }
        Ok(())
    }

    /// Completion settings for the configured model.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.agent.model.clone(),
            max_tokens: self.completion.max_tokens,
            temperature: self.completion.temperature,
            timeout: self.completion.timeout,
            max_retries: self.completion.max_retries,
            response_format: ResponseFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.app_name, "LegalContractAnalysisApp");
        assert_eq!(config.agent.name, "ContractAnalysisAgent");
        assert_eq!(config.agent.model, "gemini-2.0-flash-001");
        assert_eq!(config.provider.kind, "gemini");
        assert_eq!(config.penalty, PenaltyPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AnalyzerConfig::from_yaml("").unwrap();
        assert_eq!(config.agent.model, "gemini-2.0-flash-001");
        assert!(config.annotate);
    }

    #[test]
    fn test_partial_yaml_with_durations() {
        let config = AnalyzerConfig::from_yaml(
            r#"
agent:
  model: gemini-2.5-pro
completion:
  timeout: 45s
session:
  idle_timeout: 1h 30m
penalty:
  late_fee_rate: 0.02
annotate: false
"#,
        )
        .unwrap();

        assert_eq!(config.agent.model, "gemini-2.5-pro");
        assert_eq!(config.agent.name, "ContractAnalysisAgent");
        assert_eq!(config.completion.timeout, Duration::from_secs(45));
        assert_eq!(config.completion.max_tokens, 8192);
        assert_eq!(config.session.idle_timeout, Duration::from_secs(5400));
        assert_eq!(config.penalty.late_fee_rate, 0.02);
        assert_eq!(config.penalty.grace_period_days, 10);
        assert!(!config.annotate);
    }

    #[test]
    fn test_bad_duration_is_yaml_error() {
        let err = AnalyzerConfig::from_yaml("completion:\n  timeout: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::YamlError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (MODEL_ENV, "gemini-1.5-flash"),
            (BASE_URL_ENV, "http://localhost:9000"),
            (API_KEY_ENV, "env-key"),
        ]
        .into_iter()
        .collect();

        let mut config = AnalyzerConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.agent.model, "gemini-1.5-flash");
        assert_eq!(config.provider.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.provider.api_key.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_file_api_key_wins_and_blank_env_ignored() {
        let mut config = AnalyzerConfig::default();
        config.provider.api_key = Some("file-key".to_string());
        config.apply_overrides(|k| match k {
            API_KEY_ENV => Some("env-key".to_string()),
            MODEL_ENV => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.provider.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.agent.model, "gemini-2.0-flash-001");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AnalyzerConfig::default();
        config.penalty.late_fee_rate = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AnalyzerConfig::default();
        config.agent.model = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.completion.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_redacted_and_not_serialized() {
        let mut config = AnalyzerConfig::default();
        config.provider.api_key = Some("AIza-secret".to_string());

        assert!(!format!("{:?}", config).contains("AIza-secret"));
        assert!(!serde_yaml::to_string(&config).unwrap().contains("AIza-secret"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "agent:\n  model: gemini-2.0-flash-001\nsession:\n  max_sessions: 5").unwrap();

        let config = AnalyzerConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.session.max_sessions, 5);
    }

    #[test]
    fn test_completion_config_follows_settings() {
        let mut config = AnalyzerConfig::default();
        config.completion.max_retries = 4;
        let completion = config.completion_config();
        assert_eq!(completion.model, "gemini-2.0-flash-001");
        assert_eq!(completion.max_retries, 4);
        assert_eq!(completion.response_format, ResponseFormat::Text);
    }
}
