//! Child process execution
//!
//! Every external operation (clone, runtime creation, package install,
//! bootstrap, user command) goes through a [`CommandRunner`]. An
//! [`Invocation`] carries its own environment overrides, so a secret or a
//! credential override reaches exactly the child that needs it and nothing
//! else. Child stdio is inherited so diagnostics reach the operator verbatim.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::secrets::ExportedSecret;

/// Shell used for one-shot step lists
pub const SHELL: &str = "/bin/bash";

/// Environment overrides scoped to a single child process
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProcessContext {
    vars: Vec<(String, String)>,
    secret_keys: Vec<String>,
}

impl ProcessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain variable; a later value for the same key replaces it.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key.into(), value.into());
        self
    }

    /// Set a secret variable; its value is never logged.
    pub fn with_secret(mut self, secret: &ExportedSecret) -> Self {
        self.set(secret.var.to_string(), secret.value.expose().to_string());
        self.secret_keys.push(secret.var.to_string());
        self
    }

    fn set(&mut self, key: String, value: String) {
        if let Some(slot) = self.vars.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.vars.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.vars {
            if self.secret_keys.contains(key) {
                map.entry(key, &"****");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// One child process to launch and wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub context: ProcessContext,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            context: ProcessContext::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Run from the directory containing `path`, when it has one.
    pub fn in_parent_of(self, path: &Path) -> Self {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.current_dir(parent),
            _ => self,
        }
    }

    pub fn context(mut self, context: ProcessContext) -> Self {
        self.context = context;
        self
    }

    /// The argv rendered as a shell-quoted string, for logging.
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

/// How a child process finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code to propagate; signal termination maps to 1.
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(1)
    }
}

/// Launches child processes and waits for them
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `invocation` to completion. `Err` means the process could not be
    /// started; a non-zero exit is reported through [`ExitOutcome`].
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ExitOutcome>;
}

/// Runner backed by real processes with inherited stdio
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ExitOutcome> {
        info!("Running: {}", invocation.display());
        debug!(cwd = ?invocation.cwd, env = ?invocation.context, "Invocation details");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in invocation.context.vars() {
            command.env(key, value);
        }

        let status = command.status().await?;
        debug!("{} exited with {:?}", invocation.program, status.code());
        Ok(ExitOutcome {
            code: status.code(),
        })
    }
}

pub mod mock {
    //! Mock runner for testing lifecycle flows
    //!
    //! Records every invocation and simulates the filesystem effects the
    //! lifecycle depends on: `git clone` creates its destination and
    //! `<python> -m venv` creates the runtime's `bin/activate`. Individual
    //! invocations can be made to fail by matching on their argv.

    use super::{CommandRunner, ExitOutcome, Invocation};
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Program and arguments joined with single spaces, unquoted
    pub fn plain_argv(invocation: &Invocation) -> String {
        std::iter::once(invocation.program.as_str())
            .chain(invocation.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A failure to inject for invocations whose argv contains `pattern`
    #[derive(Debug, Clone)]
    pub struct MockFailure {
        pub pattern: String,
        pub exit_code: i32,
    }

    /// Recording runner with simulated side effects
    #[derive(Debug, Clone, Default)]
    pub struct MockRunner {
        failures: Arc<Mutex<Vec<MockFailure>>>,
        history: Arc<Mutex<Vec<Invocation>>>,
    }

    impl MockRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail any invocation whose argv contains `pattern`.
        pub fn fail_on(&self, pattern: impl Into<String>, exit_code: i32) {
            let mut failures = self.failures.lock().unwrap();
            failures.push(MockFailure {
                pattern: pattern.into(),
                exit_code,
            });
        }

        /// Get history of invocations made
        pub fn history(&self) -> Vec<Invocation> {
            self.history.lock().unwrap().clone()
        }

        /// Argv of every invocation joined with single spaces, in order
        pub fn commands(&self) -> Vec<String> {
            self.history().iter().map(plain_argv).collect()
        }

        /// Number of recorded invocations whose argv contains `needle`
        pub fn count_matching(&self, needle: &str) -> usize {
            self.commands().iter().filter(|c| c.contains(needle)).count()
        }

        pub fn clear_history(&self) {
            self.history.lock().unwrap().clear();
        }

        fn simulate(invocation: &Invocation) -> std::io::Result<()> {
            let args = &invocation.args;
            if invocation.program == "git" && args.first().map(String::as_str) == Some("clone") {
                if let Some(dest) = args.get(2) {
                    fs::create_dir_all(Path::new(dest).join(".git"))?;
                }
            } else if args.len() == 3 && args[0] == "-m" && args[1] == "venv" {
                let bin = Path::new(&args[2]).join("bin");
                fs::create_dir_all(&bin)?;
                fs::write(bin.join("activate"), "")?;
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CommandRunner for MockRunner {
        async fn run(&self, invocation: &Invocation) -> std::io::Result<ExitOutcome> {
            self.history.lock().unwrap().push(invocation.clone());

            let rendered = plain_argv(invocation);
            let failure = self
                .failures
                .lock()
                .unwrap()
                .iter()
                .find(|f| rendered.contains(&f.pattern))
                .cloned();
            if let Some(failure) = failure {
                return Ok(ExitOutcome::from_code(failure.exit_code));
            }

            Self::simulate(invocation)?;
            Ok(ExitOutcome::success())
        }
    }
}
