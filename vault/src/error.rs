//! Vault error types using thiserror 2.0.
//!
//! Every failure of the fetch pipeline is fatal except
//! [`VaultError::NotYetConsistent`], which the secret fetcher retries.

use std::fmt;
use thiserror::Error;

/// Endpoint whose response body failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// AppRole login
    Login,
    /// KV v2 secret read
    Secret,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("AppRole token"),
            Self::Secret => f.write_str("secret"),
        }
    }
}

/// Vault-specific errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Required environment variable absent
    #[error("The environment variable {0} must be set.")]
    MissingVariable(&'static str),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// AppRole login rejected or unreachable
    #[error("Error fetching Vault AppRole token: {0}")]
    AuthenticationFailed(String),

    /// Secret read rejected or unreachable
    #[error("Error fetching Vault secret: {0}")]
    SecretFetchFailed(String),

    /// Store has not yet caught up with the write the caller expects to read
    #[error("Vault secret not yet consistent: {0}")]
    NotYetConsistent(String),

    /// Store stayed inconsistent for every attempt
    #[error("Error fetching Vault secret after {attempts} attempts")]
    ConsistencyExhausted {
        /// Attempts made before giving up
        attempts: u32,
        /// Error reported by the final attempt
        #[source]
        last: Box<VaultError>,
    },

    /// Response body was not the expected JSON
    #[error("Error decoding Vault {0} from response")]
    Decode(Endpoint),

    /// Secret key unusable as an environment variable name
    #[error(
        "The supplied keyword {0} is invalid, and must consist only of uppercase letters, numbers and underscores"
    )]
    InvalidKey(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing output failed
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Child process could not be started
    #[error("Failed to launch process: {0}")]
    Launch(String),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Check if error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NotYetConsistent(_))
    }

    /// Create an authentication failed error.
    #[must_use]
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create a secret fetch failed error.
    #[must_use]
    pub fn fetch_failed(msg: impl Into<String>) -> Self {
        Self::SecretFetchFailed(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Render a non-success status the way operators expect to read it.
#[must_use]
pub fn http_error_message(status: reqwest::StatusCode) -> String {
    format!(
        "HTTP Error {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}
