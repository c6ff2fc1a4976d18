//! Configuration management for minicoder.
//!
//! Configuration can be set via environment variables:
//! - `ANTHROPIC_API_KEY` - Required. Your Anthropic API key.
//! - `ANTHROPIC_BASE_URL` - Optional. Gateway base URL. Defaults to `https://api.anthropic.com`.
//! - `MODEL` - Optional. The model to use. Defaults to `claude-sonnet-4-20250514`.
//! - `WORKSPACE_PATH` - Optional. The workspace directory. Defaults to current directory.
//! - `MAX_ROUNDS` - Optional. Maximum gateway rounds per user turn. Defaults to `50`.
//! - `MAX_TOKENS` - Optional. Maximum tokens per model response. Defaults to `8000`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Anthropic API key
    pub api_key: String,

    /// Gateway base URL
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Workspace directory for file and shell operations
    pub workspace_path: PathBuf,

    /// Maximum gateway rounds per user turn
    pub max_rounds: usize,

    /// Maximum tokens per model response
    pub max_tokens: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `ANTHROPIC_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".to_string()))?;

        let base_url = std::env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string());

        let model =
            std::env::var("MODEL").unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        let workspace_path = std::env::var("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_rounds = std::env::var("MAX_ROUNDS")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_ROUNDS".to_string(), format!("{}", e)))?;

        let max_tokens = std::env::var("MAX_TOKENS")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_TOKENS".to_string(), format!("{}", e)))?;

        Ok(Self {
            api_key,
            base_url,
            model,
            workspace_path,
            max_rounds,
            max_tokens,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            model,
            workspace_path,
            max_rounds: 50,
            max_tokens: 8000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_fills_defaults() {
        let config = Config::new(
            "key".to_string(),
            "claude-sonnet-4-20250514".to_string(),
            PathBuf::from("/tmp"),
        );
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.max_rounds, 50);
        assert_eq!(config.max_tokens, 8000);
    }
}
