use anyhow::Result;
use beokay_core::lifecycle::{
    DEFAULT_BRANCH, DEFAULT_CONFIG_ENV, DEFAULT_KAYOBE_REPO, DEFAULT_PYTHON,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Kayobe environment subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a kayobe environment
    ///
    /// Clones the kayobe and kayobe-config repositories, provisions a virtual
    /// environment, writes env-vars.sh and bootstraps the control host. An
    /// existing environment at the base path is replaced after confirmation.
    Create {
        /// Environment base directory (defaults to the current directory)
        #[arg(long, value_name = "PATH")]
        base_path: Option<PathBuf>,
        /// SSH private key used for git clones
        #[arg(long, value_name = "PATH")]
        git_ssh_key: Option<PathBuf>,
        /// Install kayobe from the kayobe-config requirements.txt instead of a source clone
        #[arg(long)]
        kayobe_in_requirements: bool,
        /// Skip `kayobe control host bootstrap`
        #[arg(long)]
        no_bootstrap: bool,
        /// Kayobe repository URL
        #[arg(long, value_name = "URL", default_value = DEFAULT_KAYOBE_REPO)]
        kayobe_repo: String,
        /// Kayobe branch or tag
        #[arg(long, value_name = "REF", default_value = DEFAULT_BRANCH)]
        kayobe_branch: String,
        /// Kayobe configuration repository URL
        #[arg(long, value_name = "URL")]
        kayobe_config_repo: String,
        /// Kayobe configuration branch or tag
        #[arg(long, value_name = "REF", default_value = DEFAULT_BRANCH)]
        kayobe_config_branch: String,
        /// Environment file, relative to the kayobe-config clone
        #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_ENV)]
        kayobe_config_env: PathBuf,
        /// Named kayobe environment to activate
        #[arg(long, value_name = "NAME")]
        kayobe_config_env_name: Option<String>,
        /// Python interpreter used to create the virtual environment
        #[arg(long, value_name = "EXE", default_value = DEFAULT_PYTHON)]
        python: String,
        /// File containing the Ansible vault password
        #[arg(long, value_name = "PATH")]
        vault_password_file: Option<PathBuf>,
        /// Replace an existing environment without prompting
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Delete a kayobe environment
    Destroy {
        /// Environment base directory (defaults to the current directory)
        #[arg(long, value_name = "PATH")]
        base_path: Option<PathBuf>,
    },

    /// Run a command inside a kayobe environment
    ///
    /// Examples:
    ///   beokay run --base-path ~/envs/prod -- kayobe overcloud host configure
    ///   beokay run --kayobe-config-env-name staging kayobe seed vm provision
    Run {
        /// Environment base directory (defaults to the current directory)
        #[arg(long, value_name = "PATH")]
        base_path: Option<PathBuf>,
        /// Environment file, relative to the kayobe-config clone
        #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_ENV)]
        kayobe_config_env: PathBuf,
        /// Named kayobe environment to activate
        #[arg(long, value_name = "NAME")]
        kayobe_config_env_name: Option<String>,
        /// File containing the Ansible vault password
        #[arg(long, value_name = "PATH")]
        vault_password_file: Option<PathBuf>,
        /// Command to run
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        command: Vec<String>,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version,
    about = "Kayobe environment manager",
    long_about = "Kayobe environment manager\n\n\
                  Creates, destroys and runs commands inside self-contained kayobe \
                  deployment environments.",
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    /// Log format (text or json, defaults to text, can be set via BEOKAY_LOG_FORMAT env var)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Initialize logging from the global flags and run the selected subcommand.
    pub async fn dispatch(self) -> Result<()> {
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None, // Let logging module check environment variable
        };
        let log_level = self.log_level.as_str();

        let directive = format!("beokay={},beokay_core={}", log_level, log_level);
        beokay_core::logging::init(log_format, Some(&directive))?;
        tracing::debug!("CLI initialized with log level: {}", log_level);

        match self.command {
            Some(Commands::Create {
                base_path,
                git_ssh_key,
                kayobe_in_requirements,
                no_bootstrap,
                kayobe_repo,
                kayobe_branch,
                kayobe_config_repo,
                kayobe_config_branch,
                kayobe_config_env,
                kayobe_config_env_name,
                python,
                vault_password_file,
                yes,
            }) => {
                use crate::commands::create::{execute_create, CreateArgs};

                execute_create(CreateArgs {
                    base_path,
                    git_ssh_key,
                    kayobe_in_requirements,
                    no_bootstrap,
                    kayobe_repo,
                    kayobe_branch,
                    kayobe_config_repo,
                    kayobe_config_branch,
                    kayobe_config_env,
                    kayobe_config_env_name,
                    python,
                    vault_password_file,
                    assume_yes: yes,
                })
                .await
            }
            Some(Commands::Destroy { base_path }) => {
                use crate::commands::destroy::{execute_destroy, DestroyArgs};

                execute_destroy(DestroyArgs { base_path })
            }
            Some(Commands::Run {
                base_path,
                kayobe_config_env,
                kayobe_config_env_name,
                vault_password_file,
                command,
            }) => {
                use crate::commands::run::{execute_run, RunArgs};

                execute_run(RunArgs {
                    base_path,
                    kayobe_config_env,
                    kayobe_config_env_name,
                    vault_password_file,
                    command,
                })
                .await
            }
            None => {
                // Guarded in main; keep a help-like message for direct callers
                eprintln!("Run 'beokay --help' to see available commands.");
                Ok(())
            }
        }
    }
}
