//! Error types and handling
//!
//! The error taxonomy follows the environment lifecycle: one enum per failure
//! domain (paths, secrets, fetching, provisioning, execution), all wrapped in
//! the main [`BeokayError`] enum. Subprocess failures carry the child's exit
//! code so the CLI can propagate it unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Base path resolution errors
#[derive(Error, Debug)]
pub enum PathError {
    /// Base path is empty or cannot be made absolute
    #[error("Invalid base path '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

/// Secret file errors
#[derive(Error, Debug)]
pub enum SecretError {
    /// Secret file was given but could not be read
    #[error("Failed to read secret file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Repository fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// The git executable could not be started
    #[error("Failed to execute git: {0}")]
    Spawn(#[source] std::io::Error),

    /// Clone process exited non-zero
    #[error("Failed to clone {url} at {reference} (exit code {code})")]
    CloneFailed {
        url: String,
        reference: String,
        code: i32,
    },
}

/// Runtime provisioning errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Interpreter or package installer could not be started
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A provisioning step exited non-zero
    #[error("Runtime provisioning failed during {step} (exit code {code})")]
    Failed { step: String, code: i32 },

    /// Requirements manifest does not exist in the config clone
    #[error("Requirements manifest not found: {}", path.display())]
    MissingManifest { path: PathBuf },
}

/// Bootstrap and user command errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Shell could not be started
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Bootstrap entry point exited non-zero
    #[error("Control host bootstrap failed with exit code {code}")]
    BootstrapFailed { code: i32 },

    /// User-supplied command exited non-zero
    #[error("Command failed with exit code {code}")]
    CommandFailed { code: i32 },
}

/// Main error enum wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum BeokayError {
    /// Base path errors
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Secret loading errors
    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    /// Git-related errors
    #[error("Git error: {0}")]
    Fetch(#[from] FetchError),

    /// Runtime provisioning errors
    #[error("Provision error: {0}")]
    Provision(#[from] ProvisionError),

    /// Bootstrap or command execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Operator declined to overwrite an existing environment
    #[error("Aborted: existing environment at {} left untouched", path.display())]
    UserAborted { path: PathBuf },

    /// Environment has not been created
    #[error("No environment found at {}; run 'beokay create' first", path.display())]
    NotCreated { path: PathBuf },

    /// Environment exists but a component needed to run in it does not
    #[error("Environment incomplete: {} is missing; run 'beokay create'", path.display())]
    MissingComponent { path: PathBuf },

    /// Filesystem errors while allocating or writing the environment
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BeokayError {
    /// Process exit code this error should surface as.
    ///
    /// Subprocess failures propagate the child's code, declining an
    /// overwrite is a clean exit, anything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            BeokayError::Fetch(FetchError::CloneFailed { code, .. })
            | BeokayError::Provision(ProvisionError::Failed { code, .. })
            | BeokayError::Execution(ExecutionError::BootstrapFailed { code })
            | BeokayError::Execution(ExecutionError::CommandFailed { code }) => *code,
            BeokayError::UserAborted { .. } => 0,
            _ => 1,
        }
    }
}

/// Convenience type alias for Results with BeokayError
pub type Result<T> = std::result::Result<T, BeokayError>;
