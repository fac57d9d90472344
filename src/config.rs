//! Configuration loading and management for precis.
//!
//! Loads settings from `precis.toml` with environment variable overrides for
//! the service address and sensitive data. Every section is optional.

use crate::export::DEFAULT_FILENAME_PREFIX;
use crate::summary::SummaryLength;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `service.base_url`
pub const SERVICE_URL_ENV: &str = "PRECIS_SERVICE_URL";

/// Environment variable overriding `api.gemini_key`
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
}

/// Which summariser sits behind the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The HTTP summarisation service
    #[default]
    Http,
    /// Gemini called directly from this process
    Gemini,
}

/// Summarisation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub backend: Backend,
    /// Base URL of the HTTP service (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Requested summary length
    pub length: SummaryLength,
}

/// LLM configuration for the Gemini backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier (e.g., "gemini-2.0-flash")
    pub model: String,
    /// System persona for the agent
    pub persona: String,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
}

/// Report export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name prefix for downloaded reports
    pub filename_prefix: String,
    /// Directory downloaded reports are written to
    pub directory: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from the default location (precis.toml in cwd or
    /// home), falling back to defaults when neither exists
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::parse(&std::fs::read_to_string(&path)?)?
            }
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration text without consulting the environment
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Override settings from environment variables
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            self.service.base_url = url;
        }
        if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
            self.api.gemini_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("precis.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("precis")
            .join("precis.toml");
        home_config.exists().then_some(home_config)
    }

    /// Get the API key for the Gemini backend
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api
            .gemini_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string()))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Http,
            base_url: "http://localhost:5000".to_string(),
            length: SummaryLength::Medium,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            persona: "You are a world-class summarization expert producing professional, balanced summaries."
                .to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            directory: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.service.backend, Backend::Http);
        assert_eq!(config.service.base_url, "http://localhost:5000");
        assert_eq!(config.service.length, SummaryLength::Medium);
        assert_eq!(config.export.filename_prefix, "summary-report");
        assert_eq!(config.agent.model, "gemini-2.0-flash");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::parse(
            r#"
            [service]
            backend = "gemini"
            length = "detailed"

            [export]
            directory = "/tmp/reports"
            "#,
        )
        .unwrap();
        assert_eq!(config.service.backend, Backend::Gemini);
        assert_eq!(config.service.length, SummaryLength::Detailed);
        assert_eq!(config.service.base_url, "http://localhost:5000");
        assert_eq!(config.export.directory, PathBuf::from("/tmp/reports"));
        assert_eq!(config.export.filename_prefix, "summary-report");
    }

    #[test]
    fn unknown_length_is_a_parse_error() {
        let err = Config::parse("[service]\nlength = \"huge\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn api_key_must_be_present_and_non_blank() {
        let mut config = Config::default();
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey(_))));
        config.api.gemini_key = Some("  ".into());
        assert!(config.api_key().is_err());
        config.api.gemini_key = Some("secret".into());
        assert_eq!(config.api_key().unwrap(), "secret");
    }

    #[test]
    fn load_from_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[export]\nfilename_prefix = \"notes\"").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.export.filename_prefix, "notes");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }
}
