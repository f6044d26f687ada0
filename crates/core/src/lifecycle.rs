//! Environment lifecycle: create, destroy, run
//!
//! An environment is either absent (no base directory) or present. `create`
//! moves it to present, destructively replacing an existing base directory
//! only after the caller's [`Confirm`] capability agrees. `destroy` removes
//! the whole tree without asking. `run` launches one command inside the
//! environment and changes nothing on disk.
//!
//! Steps run strictly in sequence and nothing is rolled back: a failure part
//! way through `create` leaves whatever was already on disk for the operator
//! to inspect or `destroy`.

use crate::activation::{run_steps, Activation, BOOTSTRAP_COMMAND};
use crate::errors::{BeokayError, ExecutionError, Result};
use crate::exec::CommandRunner;
use crate::git::{self, CloneRequest};
use crate::layout::EnvironmentLayout;
use crate::secrets;
use crate::venv::{self, InstallSource, ProvisionRequest};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Default kayobe source repository
pub const DEFAULT_KAYOBE_REPO: &str = "https://github.com/openstack/kayobe";
/// Default branch for both repositories
pub const DEFAULT_BRANCH: &str = "master";
/// Default environment file within the config clone
pub const DEFAULT_CONFIG_ENV: &str = "kayobe-env";
/// Default interpreter for creating the runtime
pub const DEFAULT_PYTHON: &str = "python3";

/// Directory mode for the base path and its immediate subtrees
const DIR_MODE: u32 = 0o700;
/// Activation script mode
const SCRIPT_MODE: u32 = 0o755;

/// Yes/no confirmation capability
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> io::Result<bool>;
}

/// Non-interactive confirmation with a fixed answer
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        info!("{} [auto-answered {}]", prompt, if self.0 { "yes" } else { "no" });
        Ok(self.0)
    }
}

/// Observed on-disk state of an environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentState {
    /// Base directory does not exist
    Absent,
    /// Config clone and runtime are both in place
    Present,
    /// Base directory exists but some components are missing
    Partial { missing: Vec<PathBuf> },
}

/// Inspect which parts of an environment exist.
pub fn inspect(layout: &EnvironmentLayout) -> EnvironmentState {
    if !layout.base().exists() {
        return EnvironmentState::Absent;
    }

    let missing: Vec<PathBuf> = [layout.config_clone(), layout.runtime_activate()]
        .into_iter()
        .filter(|path| !path.exists())
        .collect();

    if missing.is_empty() {
        EnvironmentState::Present
    } else {
        EnvironmentState::Partial { missing }
    }
}

/// Options for `create`
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub kayobe_repo: String,
    pub kayobe_branch: String,
    pub kayobe_config_repo: String,
    pub kayobe_config_branch: String,
    pub kayobe_config_env: PathBuf,
    pub kayobe_config_env_name: Option<String>,
    pub python: String,
    pub vault_password_file: Option<PathBuf>,
    pub git_ssh_key: Option<PathBuf>,
    /// Install the tool from the config repo's requirements manifest
    pub kayobe_in_requirements: bool,
    /// Skip the bootstrap invocation
    pub no_bootstrap: bool,
}

impl CreateOptions {
    /// Defaults for everything but the config repository.
    pub fn new(kayobe_config_repo: impl Into<String>) -> Self {
        Self {
            kayobe_repo: DEFAULT_KAYOBE_REPO.to_string(),
            kayobe_branch: DEFAULT_BRANCH.to_string(),
            kayobe_config_repo: kayobe_config_repo.into(),
            kayobe_config_branch: DEFAULT_BRANCH.to_string(),
            kayobe_config_env: PathBuf::from(DEFAULT_CONFIG_ENV),
            kayobe_config_env_name: None,
            python: DEFAULT_PYTHON.to_string(),
            vault_password_file: None,
            git_ssh_key: None,
            kayobe_in_requirements: false,
            no_bootstrap: false,
        }
    }
}

/// Options for `run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub kayobe_config_env: PathBuf,
    pub kayobe_config_env_name: Option<String>,
    pub vault_password_file: Option<PathBuf>,
    pub command: Vec<String>,
}

impl RunOptions {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kayobe_config_env: PathBuf::from(DEFAULT_CONFIG_ENV),
            kayobe_config_env_name: None,
            vault_password_file: None,
            command: command.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of a successful `create`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Created and bootstrapped
    Bootstrapped,
    /// Created, bootstrap skipped on request
    Created,
}

/// Result of `destroy`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Removed,
    AlreadyAbsent,
}

/// Drives create, destroy and run for one environment
pub struct Lifecycle<'a> {
    layout: EnvironmentLayout,
    runner: &'a dyn CommandRunner,
}

impl<'a> Lifecycle<'a> {
    pub fn new(layout: EnvironmentLayout, runner: &'a dyn CommandRunner) -> Self {
        Self { layout, runner }
    }

    pub fn layout(&self) -> &EnvironmentLayout {
        &self.layout
    }

    /// Create the environment, replacing an existing one after confirmation.
    ///
    /// Declining the overwrite returns [`BeokayError::UserAborted`] having
    /// changed nothing.
    #[instrument(name = "env.create", skip_all, fields(base = %self.layout.base().display()))]
    pub async fn create(
        &self,
        options: &CreateOptions,
        confirm: &dyn Confirm,
    ) -> Result<CreateOutcome> {
        let secret = secrets::load_vault_password(options.vault_password_file.as_deref())?;

        self.allocate(confirm)?;

        git::fetch(
            self.runner,
            &CloneRequest::new(
                &options.kayobe_config_repo,
                &options.kayobe_config_branch,
                self.layout.config_clone(),
            )
            .with_ssh_key(options.git_ssh_key.clone()),
        )
        .await?;

        let source = if options.kayobe_in_requirements {
            InstallSource::Requirements(self.layout.requirements_manifest())
        } else {
            git::fetch(
                self.runner,
                &CloneRequest::new(
                    &options.kayobe_repo,
                    &options.kayobe_branch,
                    self.layout.tool_source(),
                )
                .with_ssh_key(options.git_ssh_key.clone()),
            )
            .await?;
            InstallSource::Local(self.layout.tool_source())
        };

        venv::provision(
            self.runner,
            &ProvisionRequest {
                runtime_path: self.layout.runtime(),
                interpreter: options.python.clone(),
                source,
            },
        )
        .await?;

        let activation = Activation::new(self.layout.clone(), &options.kayobe_config_env)
            .with_environment(options.kayobe_config_env_name.clone())
            .with_secret(secret);
        self.write_activation_script(&activation)?;

        if options.no_bootstrap {
            info!("Skipping control host bootstrap");
            return Ok(CreateOutcome::Created);
        }

        info!("Bootstrapping control host");
        let outcome = run_steps(
            self.runner,
            &activation.one_shot(BOOTSTRAP_COMMAND),
            &self.layout.config_clone(),
            activation.process_context(),
        )
        .await?;
        if !outcome.is_success() {
            return Err(ExecutionError::BootstrapFailed {
                code: outcome.exit_code(),
            }
            .into());
        }

        info!("Environment ready at {}", self.layout.base().display());
        Ok(CreateOutcome::Bootstrapped)
    }

    pub fn destroy(&self) -> Result<DestroyOutcome> {
        destroy(&self.layout)
    }

    /// Run a command inside the environment from the config clone directory,
    /// returning the command's exit code.
    ///
    /// A non-zero exit is reported as [`ExecutionError::CommandFailed`].
    #[instrument(name = "env.run", skip_all, fields(base = %self.layout.base().display()))]
    pub async fn run(&self, options: &RunOptions) -> Result<i32> {
        match inspect(&self.layout) {
            EnvironmentState::Absent => {
                return Err(BeokayError::NotCreated {
                    path: self.layout.base().to_path_buf(),
                })
            }
            EnvironmentState::Partial { missing } => {
                let config_clone = self.layout.config_clone();
                if missing.contains(&config_clone) {
                    return Err(BeokayError::MissingComponent { path: config_clone });
                }
                for path in &missing {
                    warn!("Environment incomplete, missing {}", path.display());
                }
            }
            EnvironmentState::Present => {}
        }

        let secret = secrets::load_vault_password(options.vault_password_file.as_deref())?;
        let activation = Activation::new(self.layout.clone(), &options.kayobe_config_env)
            .with_environment(options.kayobe_config_env_name.clone())
            .with_secret(secret);

        let outcome = run_steps(
            self.runner,
            &activation.one_shot(options.command.iter().cloned()),
            &self.layout.config_clone(),
            activation.process_context(),
        )
        .await?;

        if outcome.is_success() {
            Ok(0)
        } else {
            Err(ExecutionError::CommandFailed {
                code: outcome.exit_code(),
            }
            .into())
        }
    }

    /// Create the base directory and its subtrees, owner-only. An existing
    /// base is deleted only after confirmation.
    fn allocate(&self, confirm: &dyn Confirm) -> Result<()> {
        let base = self.layout.base();
        if base.exists() {
            let prompt = format!(
                "{} already exists. Delete it and create a new environment?",
                base.display()
            );
            if !confirm.confirm(&prompt)? {
                return Err(BeokayError::UserAborted {
                    path: base.to_path_buf(),
                });
            }
            info!("Removing existing environment at {}", base.display());
            fs::remove_dir_all(base)?;
        }

        create_private_dir(base)?;
        create_private_dir(&self.layout.src_dir())?;
        create_private_dir(&self.layout.venvs_dir())?;
        Ok(())
    }

    fn write_activation_script(&self, activation: &Activation) -> Result<()> {
        let path = self.layout.activation_script();
        fs::write(&path, activation.persisted().render_script())?;
        set_mode(&path, SCRIPT_MODE)?;
        info!("Wrote activation script {}", path.display());
        Ok(())
    }
}

/// Remove the environment tree. No confirmation, no-op when absent.
#[instrument(name = "env.destroy", skip_all, fields(base = %layout.base().display()))]
pub fn destroy(layout: &EnvironmentLayout) -> Result<DestroyOutcome> {
    let base = layout.base();
    if !base.exists() {
        info!("No environment at {}", base.display());
        return Ok(DestroyOutcome::AlreadyAbsent);
    }

    fs::remove_dir_all(base)?;
    info!("Removed environment at {}", base.display());
    Ok(DestroyOutcome::Removed)
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)?;
    // DirBuilder's mode is filtered by the umask
    set_mode(path, DIR_MODE)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
