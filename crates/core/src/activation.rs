//! Activation sequence composition
//!
//! Builds the ordered shell steps that put a shell inside an environment:
//!
//! 1. export the vault password (when configured)
//! 2. source the runtime's `bin/activate`
//! 3. source the config repo's environment file, with
//!    ` --environment <name>` appended when a named environment is selected
//! 4. persisted script only: source the completion hook, then `cd` into the
//!    tool configuration directory
//!
//! The one-shot form chains steps 1-3 and the user command with `&&`, so the
//! first failing step aborts the chain and its exit code propagates. The
//! persisted form writes the same steps one per line to `env-vars.sh`.
//!
//! All shell quoting happens in [`Step::render`].

use crate::errors::{ExecutionError, Result};
use crate::exec::{CommandRunner, ExitOutcome, Invocation, ProcessContext, SHELL};
use crate::layout::EnvironmentLayout;
use crate::secrets::{ExportedSecret, Secret};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bootstrap entry point invoked at the end of `create`
pub const BOOTSTRAP_COMMAND: [&str; 4] = ["kayobe", "control", "host", "bootstrap"];

/// One shell step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `export VAR` (value inherited from the process context) or
    /// `export VAR='value'` (value embedded)
    Export {
        var: &'static str,
        value: Option<Secret>,
    },
    /// `source <path> [args...]`
    Source { path: PathBuf, args: Vec<String> },
    /// `cd <path>`
    ChangeDir(PathBuf),
    /// An arbitrary command, one word per element
    Command(Vec<String>),
}

impl Step {
    /// Render this step as a single line of bash.
    pub fn render(&self) -> String {
        match self {
            Step::Export { var, value: None } => format!("export {}", var),
            Step::Export {
                var,
                value: Some(value),
            } => format!("export {}={}", var, single_quote(value.expose())),
            Step::Source { path, args } => {
                let mut line = format!("source {}", quote_path(path));
                for arg in args {
                    line.push(' ');
                    line.push_str(&shell_words::quote(arg));
                }
                line
            }
            Step::ChangeDir(path) => {
                let mut dir = path.to_string_lossy().into_owned();
                if !dir.ends_with('/') {
                    dir.push('/');
                }
                format!("cd {}", shell_words::quote(&dir))
            }
            Step::Command(words) => shell_words::join(words),
        }
    }
}

fn quote_path(path: &Path) -> Cow<'_, str> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => shell_words::quote(s),
        Cow::Owned(s) => Cow::Owned(shell_words::quote(&s).into_owned()),
    }
}

/// Always single-quote, so secret values never undergo expansion.
fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// An ordered list of shell steps
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepList {
    steps: Vec<Step>,
}

impl StepList {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Join steps with `&&` for a single `bash -c` invocation.
    pub fn render_chain(&self) -> String {
        self.steps
            .iter()
            .map(Step::render)
            .collect::<Vec<_>>()
            .join(" && ")
    }

    /// One step per line, newline terminated.
    pub fn render_script(&self) -> String {
        let mut script = String::new();
        for step in &self.steps {
            script.push_str(&step.render());
            script.push('\n');
        }
        script
    }
}

/// Inputs to the activation sequence of one environment
#[derive(Debug, Clone)]
pub struct Activation {
    layout: EnvironmentLayout,
    config_env: PathBuf,
    environment: Option<String>,
    secret: Option<ExportedSecret>,
}

impl Activation {
    /// `config_env` is relative to the config clone.
    pub fn new(layout: EnvironmentLayout, config_env: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            config_env: config_env.into(),
            environment: None,
            secret: None,
        }
    }

    /// Select a named environment; empty names are ignored.
    pub fn with_environment(mut self, environment: Option<String>) -> Self {
        self.environment = environment.filter(|name| !name.is_empty());
        self
    }

    pub fn with_secret(mut self, secret: Option<ExportedSecret>) -> Self {
        self.secret = secret;
        self
    }

    pub fn secret(&self) -> Option<&ExportedSecret> {
        self.secret.as_ref()
    }

    fn common_steps(&self, embed_secret: bool) -> StepList {
        let mut list = StepList::default();

        if let Some(secret) = &self.secret {
            list.push(Step::Export {
                var: secret.var,
                value: embed_secret.then(|| secret.value.clone()),
            });
        }

        list.push(Step::Source {
            path: self.layout.runtime_activate(),
            args: Vec::new(),
        });

        let args = match &self.environment {
            Some(name) => vec!["--environment".to_string(), name.clone()],
            None => Vec::new(),
        };
        list.push(Step::Source {
            path: self.layout.config_env_file(&self.config_env),
            args,
        });

        list
    }

    /// Steps for a one-shot command. The secret, if any, must be supplied
    /// through [`Activation::process_context`] rather than the command line.
    pub fn one_shot<I, S>(&self, command: I) -> StepList
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = self.common_steps(false);
        list.push(Step::Command(command.into_iter().map(Into::into).collect()));
        list
    }

    /// Steps for the persisted activation script.
    pub fn persisted(&self) -> StepList {
        let mut list = self.common_steps(true);
        list.push(Step::Source {
            path: self.layout.completion_hook(),
            args: Vec::new(),
        });
        list.push(Step::ChangeDir(self.layout.tool_config_dir()));
        list
    }

    /// Environment overrides the one-shot chain relies on.
    pub fn process_context(&self) -> ProcessContext {
        match &self.secret {
            Some(secret) => ProcessContext::new().with_secret(secret),
            None => ProcessContext::new(),
        }
    }
}

/// Run a step list as one `bash -c` invocation in `cwd`.
pub async fn run_steps(
    runner: &dyn CommandRunner,
    steps: &StepList,
    cwd: &Path,
    context: ProcessContext,
) -> Result<ExitOutcome> {
    let chain = steps.render_chain();
    debug!("Shell chain: {}", chain);

    let invocation = Invocation::new(SHELL)
        .arg("-c")
        .arg(chain)
        .current_dir(cwd)
        .context(context);

    let outcome = runner
        .run(&invocation)
        .await
        .map_err(|source| ExecutionError::Spawn {
            program: SHELL.to_string(),
            source,
        })?;
    Ok(outcome)
}
