use anyhow::Result;
use beokay_core::errors::BeokayError;
use clap::{CommandFactory, Parser};

mod cli;
mod commands;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let parsed = cli::Cli::parse();

    // No subcommand: usage on stderr, exit 1
    if parsed.command.is_none() {
        let mut usage = cli::Cli::command();
        eprintln!("{}", usage.render_help());
        std::process::exit(1);
    }

    match parsed.dispatch().await {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(beokay_error) = err.downcast_ref::<BeokayError>() {
                // Declining an overwrite is a valid outcome
                if let BeokayError::UserAborted { .. } = beokay_error {
                    eprintln!("{}", beokay_error);
                    std::process::exit(0);
                }
                eprintln!("Error: {}", beokay_error);
                std::process::exit(beokay_error.exit_code());
            }

            Err(err)
        }
    }
}
