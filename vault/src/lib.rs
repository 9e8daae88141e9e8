//! Fetch a HashiCorp Vault secret into the environment.
//!
//! Logs in with AppRole, reads a single KV v2 secret (waiting out replica
//! lag signalled by HTTP 412) and renders it as shell assignments or hands
//! it to a child process.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod launch;
pub mod output;
pub mod secrets;

pub use client::VaultClient;
pub use config::{Credentials, MAX_RETRIES, RETRY_BACKOFF_FACTOR, SecretLocation, VaultConfig};
pub use error::{Endpoint, VaultError, VaultResult};
pub use output::{OutputFormat, write_secret};
pub use secrets::{AccessToken, SecretDocument};
