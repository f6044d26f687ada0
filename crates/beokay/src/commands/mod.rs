//! Command implementations
//!
//! This module contains implementations for all CLI subcommands.

pub mod create;
pub mod destroy;
pub mod run;
pub mod shared;
