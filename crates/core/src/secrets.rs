//! Vault password loading
//!
//! The automation tool reads its vault password from a fixed environment
//! variable. The password lives in a local file outside the environment
//! directory; this module reads it once and hands it to whoever spawns a
//! child process that needs it. Nothing here mutates the process environment.

use crate::errors::{Result, SecretError};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Environment variable the automation tool reads its vault password from
pub const VAULT_PASSWORD_ENV: &str = "KAYOBE_VAULT_PASSWORD";

/// Replacement text for secret values in logs
const REDACTION_PLACEHOLDER: &str = "****";

/// A secret string that never prints its value
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Only call this at the point of handing the value
    /// to a child process or writing the owner-only activation script.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTION_PLACEHOLDER)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTION_PLACEHOLDER)
    }
}

/// A secret bound to the environment variable it is exposed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedSecret {
    pub var: &'static str,
    pub value: Secret,
}

impl ExportedSecret {
    pub fn vault_password(value: Secret) -> Self {
        Self {
            var: VAULT_PASSWORD_ENV,
            value,
        }
    }
}

/// Load the vault password from `path`, if one was given.
///
/// Trailing newlines are trimmed, matching what a shell `$(cat file)` yields.
/// An empty file is still returned (with a warning) rather than dropped.
#[instrument(skip_all, fields(file = ?path))]
pub fn load_vault_password(path: Option<&Path>) -> Result<Option<ExportedSecret>> {
    let Some(path) = path else {
        debug!("No vault password file configured");
        return Ok(None);
    };

    let content = fs::read_to_string(path).map_err(|source| SecretError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = content.trim_end_matches(['\n', '\r']);
    if value.is_empty() {
        warn!("Vault password file {} is empty", path.display());
    }

    debug!("Loaded vault password from {}", path.display());
    Ok(Some(ExportedSecret::vault_password(Secret::new(value))))
}
