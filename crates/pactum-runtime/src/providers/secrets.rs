//! Secure credential handling for LLM providers.
//!
//! Credentials are wrapped in `secrecy::SecretString` as soon as they are
//! read, never appear in `Debug`/`Display` output, and must be exposed
//! explicitly at the point of use.
//!
//! ```ignore
//! let cred = ApiCredential::from_config_or_env(config.api_key.as_deref(), "GOOGLE_API_KEY", "Gemini API key")?;
//! request.header("x-goog-api-key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from the configuration file
    Config,
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Use the configured value if present and non-blank, else the environment.
    pub fn from_config_or_env(
        configured: Option<&str>,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        Self::from_lookup(configured, env_var, name, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        configured: Option<&str>,
        env_var: &str,
        name: &'static str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = configured.filter(|v| !v.trim().is_empty()) {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Some(value) = lookup(env_var).filter(|v| !v.trim().is_empty()) {
            return Ok(Self::new(value, CredentialSource::Environment, name));
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set 'provider.api_key' in config or the {} environment variable",
            name, env_var
        )))
    }

    /// Expose the credential value for use in API calls.
    ///
    /// Only call this where the value is actually sent. Never store the result.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "AIza-super-secret-key-12345";

    #[test]
    fn test_debug_and_display_redact() {
        let cred = ApiCredential::new(SECRET, CredentialSource::Programmatic, "Gemini API key");
        let debug = format!("{:?}", cred);
        let display = format!("{}", cred);

        assert!(!debug.contains(SECRET));
        assert!(debug.contains("[REDACTED]"));
        assert!(!display.contains(SECRET));
        assert_eq!(display, "Gemini API key from programmatic [REDACTED]");
    }

    #[test]
    fn test_expose_returns_value() {
        let cred = ApiCredential::new(SECRET, CredentialSource::Programmatic, "key");
        assert_eq!(cred.expose(), SECRET);
    }

    #[test]
    fn test_config_wins_over_environment() {
        let cred = ApiCredential::from_lookup(Some("from-config"), "GOOGLE_API_KEY", "key", |_| {
            Some("from-env".to_string())
        })
        .unwrap();
        assert_eq!(cred.expose(), "from-config");
        assert_eq!(cred.source(), CredentialSource::Config);
    }

    #[test]
    fn test_blank_config_falls_back_to_environment() {
        let cred = ApiCredential::from_lookup(Some("  "), "GOOGLE_API_KEY", "key", |name| {
            (name == "GOOGLE_API_KEY").then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(cred.expose(), "from-env");
        assert_eq!(cred.source(), CredentialSource::Environment);
    }

    #[test]
    fn test_missing_everywhere_is_not_configured() {
        let err = ApiCredential::from_lookup(None, "GOOGLE_API_KEY", "Gemini API key", |_| None)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("GOOGLE_API_KEY"));
        assert!(message.contains("Gemini API key"));
    }
}
