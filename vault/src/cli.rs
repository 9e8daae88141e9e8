//! Command-line interface definition.

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use rust_common::TracingConfig;

/// Fetch a Vault secret and expose it as environment variables
///
/// Logs in with AppRole, reads one KV v2 secret and prints it as shell
/// assignments. Output is suppressed when stdout is a terminal; use
/// `eval "$(fetch-vault-credentials)"` or `exec` instead.
#[derive(Parser, Debug)]
#[command(name = "fetch-vault-credentials")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand; `export` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print an `echo` summary and a quoted `export` line (default)
    Export,

    /// Print raw KEY=VALUE lines
    Env,

    /// Run a command with the secret added to its environment
    #[command(alias = "run")]
    Exec {
        /// Command and arguments to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

impl Cli {
    /// Subcommand to run, defaulting to `export`.
    #[must_use]
    pub fn action(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Export)
    }

    /// Tracing configuration from the global flags.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        let config = TracingConfig::default().with_log_level(&self.log_level);
        if self.json_logs {
            config.with_json_output()
        } else {
            config
        }
    }
}

impl Commands {
    /// Output format for the printing subcommands.
    #[must_use]
    pub const fn output_format(&self) -> Option<OutputFormat> {
        match self {
            Self::Export => Some(OutputFormat::Export),
            Self::Env => Some(OutputFormat::Env),
            Self::Exec { .. } => None,
        }
    }
}
