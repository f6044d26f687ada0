//! Run command implementation
//!
//! Implements the `beokay run` subcommand: activate the environment and run
//! one command in it from the kayobe-config clone. The command's exit code
//! becomes the process exit code.

use crate::commands::shared::resolve_layout;
use anyhow::Result;
use beokay_core::exec::SystemRunner;
use beokay_core::lifecycle::{Lifecycle, RunOptions};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Run command arguments
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub base_path: Option<PathBuf>,
    pub kayobe_config_env: PathBuf,
    pub kayobe_config_env_name: Option<String>,
    pub vault_password_file: Option<PathBuf>,
    pub command: Vec<String>,
}

/// Execute the run command
#[instrument(skip(args))]
pub async fn execute_run(args: RunArgs) -> Result<()> {
    debug!("Run command: {:?}", args.command);

    let layout = resolve_layout(args.base_path)?;
    let runner = SystemRunner::new();
    let lifecycle = Lifecycle::new(layout, &runner);

    let options = RunOptions {
        kayobe_config_env: args.kayobe_config_env,
        kayobe_config_env_name: args.kayobe_config_env_name,
        vault_password_file: args.vault_password_file,
        command: args.command,
    };
    lifecycle.run(&options).await?;
    Ok(())
}
