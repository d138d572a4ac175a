//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PEDDLER_API_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `PEDDLER_API_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `PEDDLER_STORAGE_PATH` - Path of the persisted storage file; when unset
//!   the stores run on in-memory storage and nothing survives a restart

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend REST API
    pub api_url: Url,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Persisted storage file path, if storage should survive restarts
    pub storage_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("PEDDLER_API_URL")?
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("PEDDLER_API_URL".to_owned(), e.to_string()))?;

        let timeout_secs = get_env_or_default(
            "PEDDLER_API_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("PEDDLER_API_TIMEOUT_SECS".to_owned(), e.to_string())
        })?;

        let storage_path = get_optional_env("PEDDLER_STORAGE_PATH").map(PathBuf::from);

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            storage_path,
        })
    }

    /// Construct a configuration directly, for tests and embedding.
    #[must_use]
    pub const fn new(api_url: Url, request_timeout: Duration) -> Self {
        Self {
            api_url,
            request_timeout,
            storage_path: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
