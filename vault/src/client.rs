//! Vault HTTP client: AppRole login and KV v2 reads.

use crate::{
    config::VaultConfig,
    error::{Endpoint, VaultError, VaultResult, http_error_message},
    secrets::{AccessToken, AuthResponse, KvResponse, SecretDocument},
};
use reqwest::{Client, Response};
use rust_common::{Attempt, RetryError, RetryPolicy, build_http_client};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Header scoping a request to a Vault namespace.
pub const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Header carrying the client token.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Header carrying the replication consistency index.
pub const INDEX_HEADER: &str = "X-Vault-Index";

/// Vault client for a single AppRole login followed by a single secret read.
pub struct VaultClient {
    config: VaultConfig,
    http: Client,
    retry: RetryPolicy,
}

impl VaultClient {
    /// Create a new Vault client.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Http`] if the HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        let http = build_http_client(&config.http).map_err(VaultError::Http)?;
        let retry = RetryPolicy::new(config.retry.clone());

        Ok(Self {
            config,
            http,
            retry,
        })
    }

    /// Exchange the AppRole credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AuthenticationFailed`] for transport failures and
    /// non-2xx responses, and [`VaultError::Decode`] for malformed bodies.
    /// Nothing is retried.
    #[instrument(skip(self), fields(addr = %self.config.addr, role_namespace = %self.config.credentials.role_namespace))]
    pub async fn authenticate(&self) -> VaultResult<AccessToken> {
        let credentials = &self.config.credentials;
        let url = self.config.url("auth/approle/login");
        let body = serde_json::json!({
            "role_id": credentials.role_id,
            "secret_id": credentials.role_secret.expose_secret(),
        });

        let response = self
            .http
            .post(&url)
            .header(NAMESPACE_HEADER, &credentials.role_namespace)
            .json(&body)
            .send()
            .await
            .map_err(|e| VaultError::auth_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::auth_failed(http_error_message(status)));
        }

        let consistency_index = response
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let auth: AuthResponse = decode(response, Endpoint::Login, VaultError::AuthenticationFailed).await?;

        info!(
            has_consistency_index = consistency_index.is_some(),
            "Authenticated with Vault"
        );
        Ok(AccessToken {
            token: SecretString::from(auth.auth.client_token),
            consistency_index,
        })
    }

    /// Read the configured KV v2 secret, waiting out replication lag.
    ///
    /// A 412 response means the replica has not yet seen the write implied by
    /// the consistency index; the identical request is re-issued with a
    /// linear backoff until the attempt budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::ConsistencyExhausted`] when every attempt got a
    /// 412, [`VaultError::SecretFetchFailed`] for any other failure status or
    /// transport error, and [`VaultError::Decode`] for malformed bodies.
    #[instrument(skip(self, token), fields(path = %self.config.location.api_path()))]
    pub async fn fetch_secret(&self, token: &AccessToken) -> VaultResult<SecretDocument> {
        let result = self
            .retry
            .execute(|attempt| self.attempt_read(token, attempt))
            .await;
        finish_fetch(result)
    }

    /// [`VaultClient::fetch_secret`] with a caller-supplied backoff sleep.
    ///
    /// # Errors
    ///
    /// Same as [`VaultClient::fetch_secret`].
    pub async fn fetch_secret_with_sleep<S, SFut>(
        &self,
        token: &AccessToken,
        sleep: S,
    ) -> VaultResult<SecretDocument>
    where
        S: FnMut(Duration) -> SFut,
        SFut: std::future::Future<Output = ()>,
    {
        let result = self
            .retry
            .execute_with_sleep(|attempt| self.attempt_read(token, attempt), sleep)
            .await;
        finish_fetch(result)
    }

    async fn attempt_read(
        &self,
        token: &AccessToken,
        attempt: u32,
    ) -> Attempt<SecretDocument, VaultError> {
        debug!(attempt, "Requesting secret");
        Attempt::classify(self.read_secret(token).await, VaultError::is_retryable)
    }

    async fn read_secret(&self, token: &AccessToken) -> VaultResult<SecretDocument> {
        let location = &self.config.location;
        let url = self.config.url(&location.api_path());

        let mut request = self
            .http
            .get(&url)
            .header(NAMESPACE_HEADER, &location.namespace)
            .header(TOKEN_HEADER, token.token.expose_secret());

        if let Some(index) = &token.consistency_index {
            request = request.header(INDEX_HEADER, index);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VaultError::fetch_failed(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            412 => return Err(VaultError::NotYetConsistent(http_error_message(status))),
            _ if !status.is_success() => {
                return Err(VaultError::fetch_failed(http_error_message(status)));
            }
            _ => {}
        }

        let kv: KvResponse = decode(response, Endpoint::Secret, VaultError::SecretFetchFailed).await?;
        Ok(SecretDocument::from(kv.data.data))
    }
}

fn finish_fetch(result: Result<SecretDocument, RetryError<VaultError>>) -> VaultResult<SecretDocument> {
    match result {
        Ok(doc) => {
            info!(keys = doc.len(), "Fetched secret from Vault");
            Ok(doc)
        }
        Err(RetryError::Fatal(e)) => Err(e),
        Err(RetryError::Exhausted { attempts, last }) => Err(VaultError::ConsistencyExhausted {
            attempts,
            last: Box::new(last),
        }),
    }
}

/// Read a response body and parse it as JSON.
///
/// Body read failures are transport errors; parse failures collapse into a
/// fixed [`VaultError::Decode`] so parser internals never reach the caller.
async fn decode<T: DeserializeOwned>(
    response: Response,
    endpoint: Endpoint,
    transport_error: fn(String) -> VaultError,
) -> VaultResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| {
        debug!(line = e.line(), column = e.column(), "Response body is not valid JSON");
        VaultError::Decode(endpoint)
    })
}
