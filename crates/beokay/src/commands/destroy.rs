//! Destroy command implementation
//!
//! Implements the `beokay destroy` subcommand. Removal is unconditional and a
//! missing environment is not an error.

use crate::commands::shared::resolve_layout;
use anyhow::Result;
use beokay_core::lifecycle::{self, DestroyOutcome};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Destroy command arguments
#[derive(Debug, Clone)]
pub struct DestroyArgs {
    pub base_path: Option<PathBuf>,
}

/// Execute the destroy command
#[instrument(skip(args))]
pub fn execute_destroy(args: DestroyArgs) -> Result<()> {
    debug!("Destroy args: {:?}", args);

    let layout = resolve_layout(args.base_path)?;

    match lifecycle::destroy(&layout)? {
        DestroyOutcome::Removed => debug!("Environment removed"),
        DestroyOutcome::AlreadyAbsent => debug!("Nothing to remove"),
    }
    Ok(())
}
