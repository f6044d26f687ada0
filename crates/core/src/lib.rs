//! Core library for beokay
//!
//! Lifecycle management for disposable kayobe deployment environments: the
//! directory layout contract, vault password loading, repository cloning,
//! runtime provisioning, activation script composition, and the
//! create/destroy/run controller that ties them together.

pub mod activation;
pub mod errors;
pub mod exec;
pub mod git;
pub mod layout;
pub mod lifecycle;
pub mod logging;
pub mod secrets;
pub mod venv;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
