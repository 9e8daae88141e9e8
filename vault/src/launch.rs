//! Launching a process with a secret merged into its environment.

use crate::{
    error::{VaultError, VaultResult},
    output::validate_keys,
    secrets::SecretDocument,
};
use secrecy::ExposeSecret;
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::{info, instrument};

/// Run `command` with the secret's entries added to the inherited environment.
///
/// The secret's entries override inherited variables of the same name.
///
/// # Errors
///
/// Returns [`VaultError::InvalidKey`] before spawning if a key is invalid and
/// [`VaultError::Launch`] if the command is empty or cannot be started.
#[instrument(skip(doc), fields(keys = doc.len()))]
pub async fn launch(doc: &SecretDocument, command: &[String]) -> VaultResult<ExitStatus> {
    validate_keys(doc)?;

    let (program, args) = command
        .split_first()
        .ok_or_else(|| VaultError::Launch("no command given".to_string()))?;

    let mut child = Command::new(program);
    child.args(args);
    for (key, value) in doc.iter() {
        child.env(key, value.expose_secret());
    }

    info!(program = %program, "Launching process with Vault environment");
    child
        .status()
        .await
        .map_err(|e| VaultError::Launch(format!("{program}: {e}")))
}

/// Map a child's exit status onto this process's exit code.
///
/// Termination by signal maps to 1.
#[must_use]
pub fn exit_code(status: ExitStatus) -> u8 {
    status
        .code()
        .map_or(1, |code| u8::try_from(code & 0xff).unwrap_or(1))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_child_sees_secret() {
        let doc: SecretDocument = [("VAULT_ENV_TEST_KEY", "s3cret")].into_iter().collect();
        let status = launch(
            &doc,
            &cmd(&["sh", "-c", r#"test "$VAULT_ENV_TEST_KEY" = s3cret"#]),
        )
        .await
        .unwrap();

        assert!(status.success());
    }

    #[tokio::test]
    async fn test_exit_code_forwarded() {
        let status = launch(&SecretDocument::new(), &cmd(&["sh", "-c", "exit 3"]))
            .await
            .unwrap();
        assert_eq!(exit_code(status), 3);
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let result = launch(&SecretDocument::new(), &[]).await;
        assert!(matches!(result, Err(VaultError::Launch(_))));
    }

    #[tokio::test]
    async fn test_invalid_key_prevents_spawn() {
        let doc: SecretDocument = [("bad-key", "x")].into_iter().collect();
        let result = launch(&doc, &cmd(&["sh", "-c", "exit 0"])).await;
        assert!(matches!(result, Err(VaultError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let result = launch(
            &SecretDocument::new(),
            &cmd(&["/nonexistent/vault-env-test-binary"]),
        )
        .await;
        assert!(matches!(result, Err(VaultError::Launch(_))));
    }
}
