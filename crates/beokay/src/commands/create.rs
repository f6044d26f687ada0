//! Create command implementation
//!
//! Implements the `beokay create` subcommand: allocate the environment tree,
//! clone kayobe and kayobe-config, provision the virtual environment, write
//! `env-vars.sh` and bootstrap the control host.

use crate::commands::shared::{resolve_layout, TerminalPrompt};
use anyhow::Result;
use beokay_core::exec::SystemRunner;
use beokay_core::lifecycle::{AutoConfirm, Confirm, CreateOptions, CreateOutcome, Lifecycle};
use console::style;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Create command arguments
#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub base_path: Option<PathBuf>,
    pub git_ssh_key: Option<PathBuf>,
    pub kayobe_in_requirements: bool,
    pub no_bootstrap: bool,
    pub kayobe_repo: String,
    pub kayobe_branch: String,
    pub kayobe_config_repo: String,
    pub kayobe_config_branch: String,
    pub kayobe_config_env: PathBuf,
    pub kayobe_config_env_name: Option<String>,
    pub python: String,
    pub vault_password_file: Option<PathBuf>,
    /// Answer yes to the overwrite prompt
    pub assume_yes: bool,
}

impl CreateArgs {
    fn options(&self) -> CreateOptions {
        CreateOptions {
            kayobe_repo: self.kayobe_repo.clone(),
            kayobe_branch: self.kayobe_branch.clone(),
            kayobe_config_repo: self.kayobe_config_repo.clone(),
            kayobe_config_branch: self.kayobe_config_branch.clone(),
            kayobe_config_env: self.kayobe_config_env.clone(),
            kayobe_config_env_name: self.kayobe_config_env_name.clone(),
            python: self.python.clone(),
            vault_password_file: self.vault_password_file.clone(),
            git_ssh_key: self.git_ssh_key.clone(),
            kayobe_in_requirements: self.kayobe_in_requirements,
            no_bootstrap: self.no_bootstrap,
        }
    }
}

/// Execute the create command
#[instrument(skip(args))]
pub async fn execute_create(args: CreateArgs) -> Result<()> {
    debug!("Create args: {:?}", args);

    let layout = resolve_layout(args.base_path.clone())?;
    let runner = SystemRunner::new();
    let prompt = TerminalPrompt::new();
    let auto = AutoConfirm(true);
    let confirm: &dyn Confirm = if args.assume_yes { &auto } else { &prompt };

    let lifecycle = Lifecycle::new(layout, &runner);
    let outcome = lifecycle.create(&args.options(), confirm).await?;

    let script = lifecycle.layout().activation_script();
    let status = match outcome {
        CreateOutcome::Bootstrapped => "Environment created and control host bootstrapped",
        CreateOutcome::Created => "Environment created (bootstrap skipped)",
    };
    eprintln!("{}", style(status).green().bold());
    eprintln!(
        "Activate it with: {}",
        style(format!("source {}", script.display())).cyan()
    );
    Ok(())
}
