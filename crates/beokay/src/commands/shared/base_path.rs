//! Base path resolution shared by all subcommands.

use anyhow::Result;
use beokay_core::layout::EnvironmentLayout;
use std::path::PathBuf;

/// Build the environment layout for `--base-path`, defaulting to the current
/// directory.
pub fn resolve_layout(base_path: Option<PathBuf>) -> Result<EnvironmentLayout> {
    let base = match base_path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    Ok(EnvironmentLayout::new(base)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_base_path() {
        let layout = resolve_layout(Some(PathBuf::from("/tmp/envs/prod"))).unwrap();
        assert_eq!(layout.base(), std::path::Path::new("/tmp/envs/prod"));
    }

    #[test]
    fn test_default_is_current_dir() {
        let layout = resolve_layout(None).unwrap();
        assert_eq!(layout.base(), std::env::current_dir().unwrap().as_path());
    }

    #[test]
    fn test_empty_base_path_rejected() {
        assert!(resolve_layout(Some(PathBuf::new())).is_err());
    }
}
