//! Rendering a fetched secret for shell consumption.
//!
//! Output is meant for `eval`/`source`, never for a human reading a terminal:
//! [`write_secret`] writes nothing when the destination is a TTY so secret
//! values stay out of scrollback and session recordings.

use crate::{
    error::{VaultError, VaultResult},
    secrets::SecretDocument,
};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::ExposeSecret;
use std::{borrow::Cow, io::Write};
use tracing::warn;

#[allow(clippy::unwrap_used)]
static VALID_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9_]+$").unwrap());

#[allow(clippy::unwrap_used)]
static SHELL_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_@%+=:,./-]").unwrap());

/// How a secret is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// An `echo` summary line followed by one quoted `export` statement
    #[default]
    Export,
    /// One raw `KEY=VALUE` line per entry
    Env,
}

/// Check that a key is usable as an environment variable name.
///
/// # Errors
///
/// Returns [`VaultError::InvalidKey`] unless the key matches `^[A-Z0-9_]+$`.
pub fn validate_key(key: &str) -> VaultResult<()> {
    if VALID_KEY.is_match(key) {
        Ok(())
    } else {
        Err(VaultError::InvalidKey(key.to_string()))
    }
}

/// Check every key of a document, stopping at the first invalid one.
///
/// # Errors
///
/// Returns [`VaultError::InvalidKey`] naming the first offending key.
pub fn validate_keys(doc: &SecretDocument) -> VaultResult<()> {
    doc.keys().try_for_each(validate_key)
}

/// Quote a string for a POSIX shell.
///
/// Strings made only of characters a shell never interprets are returned
/// unchanged. Anything else is wrapped in single quotes with each embedded
/// single quote spliced in as `'"'"'`. The empty string becomes `''`.
#[must_use]
pub fn shell_quote(value: &str) -> Cow<'_, str> {
    if value.is_empty() {
        return Cow::Borrowed("''");
    }
    if !SHELL_UNSAFE.is_match(value) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(format!("'{}'", value.replace('\'', r#"'"'"'"#)))
}

/// Quote a value so it always appears single-quoted on the `export` line.
fn quote_literal(value: &str) -> String {
    let quoted = shell_quote(value);
    if quoted.starts_with('\'') {
        quoted.into_owned()
    } else {
        format!("'{quoted}'")
    }
}

/// Render a document as output lines.
///
/// All keys are validated before anything is rendered. An empty document
/// renders no lines, since a bare `export` would list the whole environment.
///
/// # Errors
///
/// Returns [`VaultError::InvalidKey`] if any key fails validation.
pub fn render(doc: &SecretDocument, format: OutputFormat) -> VaultResult<Vec<String>> {
    validate_keys(doc)?;

    if doc.is_empty() {
        warn!("Vault secret has no entries; nothing to export");
        return Ok(Vec::new());
    }

    let lines = match format {
        OutputFormat::Export => {
            let names = doc
                .keys()
                .map(|k| format!("'{k}'"))
                .collect::<Vec<_>>()
                .join(", ");
            let assignments = doc
                .iter()
                .map(|(k, v)| format!("'{k}'={}", quote_literal(v.expose_secret())))
                .collect::<Vec<_>>()
                .join(" ");
            vec![
                format!("echo \"Setting environment variables from Vault: {names}\""),
                format!("export {assignments}"),
            ]
        }
        OutputFormat::Env => doc
            .iter()
            .map(|(k, v)| format!("{k}={}", v.expose_secret()))
            .collect(),
    };

    Ok(lines)
}

/// Write a rendered document, unless the destination is a terminal.
///
/// Returns the number of lines written.
///
/// # Errors
///
/// Returns [`VaultError::InvalidKey`] before writing anything if a key is
/// invalid, or [`VaultError::Io`] if writing fails.
pub fn write_secret<W: Write>(
    doc: &SecretDocument,
    format: OutputFormat,
    out: &mut W,
    is_terminal: bool,
) -> VaultResult<usize> {
    let lines = render(doc, format)?;

    if is_terminal {
        warn!("Refusing to print secrets to a terminal; pipe or eval the output instead");
        return Ok(0);
    }

    for line in &lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SecretDocument {
        [("KEY1", "VALUE1"), ("KEY2", "VALUE2")].into_iter().collect()
    }

    fn written(doc: &SecretDocument, format: OutputFormat, tty: bool) -> (VaultResult<usize>, String) {
        let mut buf = Vec::new();
        let result = write_secret(doc, format, &mut buf, tty);
        (result, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_export_output() {
        let (result, out) = written(&sample(), OutputFormat::Export, false);

        assert_eq!(result.unwrap(), 2);
        assert_eq!(
            out,
            "echo \"Setting environment variables from Vault: 'KEY1', 'KEY2'\"\n\
             export 'KEY1'='VALUE1' 'KEY2'='VALUE2'\n"
        );
    }

    #[test]
    fn test_env_output() {
        let (result, out) = written(&sample(), OutputFormat::Env, false);

        assert_eq!(result.unwrap(), 2);
        assert_eq!(out, "KEY1=VALUE1\nKEY2=VALUE2\n");
    }

    #[test]
    fn test_nothing_written_to_terminal() {
        for format in [OutputFormat::Export, OutputFormat::Env] {
            let (result, out) = written(&sample(), format, true);
            assert_eq!(result.unwrap(), 0);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_invalid_key_aborts_before_output() {
        let doc: SecretDocument = [("KEY1", "VALUE1"), ("Key2", "VALUE2")].into_iter().collect();

        for format in [OutputFormat::Export, OutputFormat::Env] {
            let (result, out) = written(&doc, format, false);
            assert!(matches!(result, Err(VaultError::InvalidKey(ref k)) if k == "Key2"));
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("DATABASE_URL").is_ok());
        assert!(validate_key("_1").is_ok());
        assert!(validate_key("123").is_ok());

        assert!(validate_key("").is_err());
        assert!(validate_key("Key2").is_err());
        assert!(validate_key("KEY-2").is_err());
        assert!(validate_key("KEY 2").is_err());
        assert!(validate_key("KEY2\n").is_err());
        assert!(validate_key("KÉY").is_err());
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("plain-value_1.2/3"), "plain-value_1.2/3");
        assert_eq!(shell_quote("two words"), "'two words'");
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
    }

    #[test]
    fn test_quoted_values_are_not_wrapped_twice() {
        assert_eq!(quote_literal("VALUE1"), "'VALUE1'");
        assert_eq!(quote_literal(""), "''");
        assert_eq!(quote_literal("a b"), "'a b'");
        assert_eq!(quote_literal("'"), r#"''"'"''"#);
    }

    #[test]
    fn test_export_escapes_values() {
        let doc: SecretDocument = [("PASSWORD", "p@ss word;rm -rf"), ("QUOTE", "don't")]
            .into_iter()
            .collect();
        let lines = render(&doc, OutputFormat::Export).unwrap();

        assert_eq!(
            lines[1],
            r#"export 'PASSWORD'='p@ss word;rm -rf' 'QUOTE'='don'"'"'t'"#
        );
    }

    #[test]
    fn test_empty_document_renders_nothing() {
        let (result, out) = written(&SecretDocument::new(), OutputFormat::Export, false);
        assert_eq!(result.unwrap(), 0);
        assert!(out.is_empty());
    }
}
