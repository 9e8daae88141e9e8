//! Secret types and Vault wire structures.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Short-lived Vault token obtained from an AppRole login.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Client token sent as `X-Vault-Token`
    pub token: SecretString,
    /// Replication index returned with the login, echoed as `X-Vault-Index`
    pub consistency_index: Option<String>,
}

/// Ordered key/value mapping read from a KV v2 secret.
///
/// Entries keep the order the store returned them in. Values never appear in
/// `Debug` output.
#[derive(Debug, Clone, Default)]
pub struct SecretDocument {
    entries: Vec<(String, SecretString)>,
}

impl SecretDocument {
    /// Create an empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push((key.into(), SecretString::from(value.into())));
    }

    /// Keys in store order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretString)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.expose_secret())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Self::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl From<Map<String, Value>> for SecretDocument {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect()
    }
}

/// Vault auth response
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// Auth block
    pub auth: AuthData,
}

/// Auth block of a login response
#[derive(Debug, Deserialize)]
pub struct AuthData {
    /// Issued client token
    pub client_token: String,
}

/// Vault KV v2 response wrapper
#[derive(Debug, Deserialize)]
pub struct KvResponse {
    /// Versioned data block
    pub data: KvData,
}

/// Versioned data block of a KV v2 read
#[derive(Debug, Deserialize)]
pub struct KvData {
    /// Secret key/value pairs, in store order
    pub data: Map<String, Value>,
}
