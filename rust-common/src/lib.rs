//! Shared plumbing for the vault-env tooling.
//!
//! This crate provides centralized implementations for:
//! - HTTP client configuration and building
//! - Retry policies with linear backoff over tagged attempt results
//! - Tracing subscriber setup writing to stderr

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod http;
pub mod retry;
pub mod tracing_config;

pub use http::{HttpConfig, build_http_client};
pub use retry::{Attempt, RetryConfig, RetryError, RetryPolicy};
pub use tracing_config::{TracingConfig, init_tracing};
