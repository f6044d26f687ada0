//! Interactive yes/no confirmation on the controlling terminal.

use beokay_core::lifecycle::Confirm;
use console::{style, Term};
use std::io::{self, BufRead};

/// Asks on stderr, reads the answer from stdin. Anything but `y`/`yes`
/// (including end of input) counts as no.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl Confirm for TerminalPrompt {
    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        let term = Term::stderr();
        term.write_str(&format!("{} {} ", style(prompt).bold(), style("[y/N]").dim()))?;
        term.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
