//! fetch-vault-credentials: expose a Vault secret as environment variables.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use rust_common::init_tracing;
use vault_env::{
    VaultClient, VaultConfig,
    cli::{Cli, Commands},
    launch::{exit_code, launch},
    write_secret,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.tracing_config());

    let config = VaultConfig::from_env()?;
    let client = VaultClient::new(config)?;

    let token = client.authenticate().await?;
    let secret = client.fetch_secret(&token).await?;

    let action = cli.action();
    match action {
        Commands::Exec { command } => {
            let status = launch(&secret, &command).await?;
            debug!(%status, "Child process exited");
            Ok(ExitCode::from(exit_code(status)))
        }
        printing => {
            let format = printing.output_format().unwrap_or_default();
            let stdout = io::stdout();
            let is_terminal = stdout.is_terminal();
            write_secret(&secret, format, &mut stdout.lock(), is_terminal)
                .context("Failed to emit Vault secret")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
