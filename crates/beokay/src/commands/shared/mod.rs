//! Shared helpers for command implementations.

pub mod base_path;
pub mod prompt;

pub use base_path::resolve_layout;
pub use prompt::TerminalPrompt;
