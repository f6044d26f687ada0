//! Repository fetching
//!
//! Clones a repository at a branch or tag into a target path. When an SSH key
//! is supplied, the transport override is attached to that one clone's
//! process context and never to the parent process.

use crate::errors::{FetchError, Result};
use crate::exec::{CommandRunner, Invocation, ProcessContext};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Environment variable git consults for its SSH transport command
pub const GIT_SSH_COMMAND_ENV: &str = "GIT_SSH_COMMAND";

/// A single clone to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Repository URL
    pub url: String,
    /// Branch or tag to check out
    pub reference: String,
    /// Directory to clone into; must not exist yet
    pub destination: PathBuf,
    /// Optional private key for authenticated transport
    pub ssh_key: Option<PathBuf>,
}

impl CloneRequest {
    pub fn new(
        url: impl Into<String>,
        reference: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            reference: reference.into(),
            destination: destination.into(),
            ssh_key: None,
        }
    }

    pub fn with_ssh_key(mut self, key: Option<PathBuf>) -> Self {
        self.ssh_key = key;
        self
    }

    /// Build the clone invocation, including any credential override.
    pub fn invocation(&self) -> Invocation {
        let mut context = ProcessContext::new();
        if let Some(key) = &self.ssh_key {
            context = context.with_var(GIT_SSH_COMMAND_ENV, ssh_command(key));
        }

        Invocation::new("git")
            .arg("clone")
            .arg(&self.url)
            .path_arg(&self.destination)
            .arg("--branch")
            .arg(&self.reference)
            .context(context)
            .in_parent_of(&self.destination)
    }
}

/// SSH transport command pinned to one identity file
fn ssh_command(key: &Path) -> String {
    let key = key.to_string_lossy();
    format!(
        "ssh -i {} -o IdentitiesOnly=yes",
        shell_words::quote(key.as_ref())
    )
}

/// Clone `request.url` at `request.reference` into `request.destination`.
///
/// No retry: any non-zero exit from git is a [`FetchError::CloneFailed`].
#[instrument(skip(runner), fields(url = %request.url, reference = %request.reference))]
pub async fn fetch(runner: &dyn CommandRunner, request: &CloneRequest) -> Result<()> {
    info!(
        "Cloning {} ({}) into {}",
        request.url,
        request.reference,
        request.destination.display()
    );

    let outcome = runner
        .run(&request.invocation())
        .await
        .map_err(FetchError::Spawn)?;

    if outcome.is_success() {
        info!("Cloned {}", request.url);
        Ok(())
    } else {
        Err(FetchError::CloneFailed {
            url: request.url.clone(),
            reference: request.reference.clone(),
            code: outcome.exit_code(),
        }
        .into())
    }
}
