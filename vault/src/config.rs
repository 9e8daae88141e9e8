//! Vault client configuration.
//!
//! All configuration is read once, at the process boundary, and handed to
//! [`crate::VaultClient`] as an explicit value.

use crate::error::{VaultError, VaultResult};
use rust_common::{HttpConfig, RetryConfig};
use secrecy::SecretString;
use std::{env, time::Duration};
use url::Url;

/// Attempts made against a store that keeps answering 412.
pub const MAX_RETRIES: u32 = 5;

/// Multiplier turning the attempt number into a backoff delay.
pub const RETRY_BACKOFF_FACTOR: u32 = 2;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("vault-env/", env!("CARGO_PKG_VERSION"));

/// Required environment variables, in the order they are checked.
pub const REQUIRED_VARS: [&str; 7] = [
    "VAULT_ROLE_NAMESPACE",
    "VAULT_ROLE_ID",
    "VAULT_ROLE_SECRET",
    "VAULT_ADDRESS",
    "VAULT_NAMESPACE",
    "VAULT_KV_STORE",
    "VAULT_SECRET",
];

/// AppRole login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Namespace the AppRole is mounted in
    pub role_namespace: String,
    /// AppRole role id
    pub role_id: String,
    /// AppRole secret id
    pub role_secret: SecretString,
}

/// Where the secret lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretLocation {
    /// Namespace holding the KV mount
    pub namespace: String,
    /// KV v2 mount name
    pub kv_store: String,
    /// Secret name within the mount
    pub secret: String,
}

impl SecretLocation {
    /// API path of the secret, relative to `/v1/`.
    #[must_use]
    pub fn api_path(&self) -> String {
        format!("{}/data/{}", self.kv_store, self.secret)
    }
}

/// Vault client configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address, without a trailing slash
    pub addr: String,
    /// AppRole credentials
    pub credentials: Credentials,
    /// Secret to read
    pub location: SecretLocation,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Retry settings for the consistency wait
    pub retry: RetryConfig,
}

impl VaultConfig {
    /// Create a new configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] if `addr` is not an absolute URL.
    pub fn new(
        addr: impl Into<String>,
        credentials: Credentials,
        location: SecretLocation,
    ) -> VaultResult<Self> {
        Ok(Self {
            addr: normalize_addr(addr.into())?,
            credentials,
            location,
            http: HttpConfig::default().with_user_agent(USER_AGENT),
            retry: RetryConfig::default()
                .with_max_retries(MAX_RETRIES)
                .with_backoff_factor(RETRY_BACKOFF_FACTOR),
        })
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is honoured; parent
    /// directories are not searched.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::MissingVariable`] naming the first absent
    /// required variable, or [`VaultError::InvalidConfig`] for malformed values.
    pub fn from_env() -> VaultResult<Self> {
        dotenvy::from_path(".env").ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Every required variable is checked before any value is interpreted,
    /// so a missing variable is always reported ahead of a malformed one.
    ///
    /// # Errors
    ///
    /// Same as [`VaultConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> VaultResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(REQUIRED_VARS.len());
        for name in REQUIRED_VARS {
            values.push(lookup(name).ok_or(VaultError::MissingVariable(name))?);
        }
        let [role_namespace, role_id, role_secret, addr, namespace, kv_store, secret]: [String; 7] =
            values
                .try_into()
                .map_err(|_| VaultError::invalid_config("required variables incomplete"))?;

        let mut config = Self::new(
            addr,
            Credentials {
                role_namespace,
                role_id,
                role_secret: SecretString::from(role_secret),
            },
            SecretLocation {
                namespace,
                kv_store,
                secret,
            },
        )?;

        if let Some(raw) = lookup("VAULT_REQUEST_TIMEOUT") {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                VaultError::invalid_config(format!("Invalid VAULT_REQUEST_TIMEOUT: {e}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Set retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Full URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.addr, path)
    }
}

fn normalize_addr(addr: String) -> VaultResult<String> {
    let parsed = Url::parse(&addr)
        .map_err(|e| VaultError::invalid_config(format!("Invalid VAULT_ADDRESS '{addr}': {e}")))?;
    if parsed.cannot_be_a_base() {
        return Err(VaultError::invalid_config(format!(
            "Invalid VAULT_ADDRESS '{addr}': not a base URL"
        )));
    }
    Ok(addr.trim_end_matches('/').to_string())
}
