//! Environment directory layout
//!
//! Every on-disk location of an environment is derived here from a single base
//! directory, so create, run and destroy always agree on where things live:
//!
//! ```text
//! <base>/
//!   src/kayobe/            tool source clone (absent when installed from requirements)
//!   src/kayobe-config/     site configuration clone
//!   venvs/kayobe/          isolated runtime, entry point at bin/activate
//!   env-vars.sh            generated activation script
//! ```
//!
//! Nothing in this module touches the filesystem.

use crate::errors::{PathError, Result};
use std::path::{Component, Path, PathBuf};

/// Name of the automation tool; used for clone, runtime and config directories.
pub const TOOL_NAME: &str = "kayobe";

const SRC_DIR: &str = "src";
const VENVS_DIR: &str = "venvs";
const CONFIG_CLONE_DIR: &str = "kayobe-config";
const ACTIVATION_SCRIPT: &str = "env-vars.sh";
const REQUIREMENTS_MANIFEST: &str = "requirements.txt";

/// Resolved layout of one environment rooted at an absolute base path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentLayout {
    base: PathBuf,
}

impl EnvironmentLayout {
    /// Resolve `base` to an absolute, lexically normalized path.
    ///
    /// Relative paths are resolved against the current working directory.
    /// The path does not need to exist.
    pub fn new(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        if base.as_os_str().is_empty() {
            return Err(PathError::Invalid {
                path: String::new(),
                reason: "path is empty".to_string(),
            }
            .into());
        }

        let absolute = if base.is_absolute() {
            base.to_path_buf()
        } else {
            let cwd = std::env::current_dir().map_err(|e| PathError::Invalid {
                path: base.display().to_string(),
                reason: format!("cannot determine current directory: {}", e),
            })?;
            cwd.join(base)
        };

        let normalized = normalize(&absolute);
        if normalized.parent().is_none() {
            return Err(PathError::Invalid {
                path: base.display().to_string(),
                reason: "refusing to use the filesystem root".to_string(),
            }
            .into());
        }

        Ok(Self { base: normalized })
    }

    /// Join relative segments onto the base path.
    pub fn resolve<I, S>(&self, segments: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut path = self.base.clone();
        for segment in segments {
            path.push(segment);
        }
        path
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory holding both clones
    pub fn src_dir(&self) -> PathBuf {
        self.resolve([SRC_DIR])
    }

    /// Directory holding isolated runtimes
    pub fn venvs_dir(&self) -> PathBuf {
        self.resolve([VENVS_DIR])
    }

    /// Tool source clone
    pub fn tool_source(&self) -> PathBuf {
        self.resolve([SRC_DIR, TOOL_NAME])
    }

    /// Site configuration clone
    pub fn config_clone(&self) -> PathBuf {
        self.resolve([SRC_DIR, CONFIG_CLONE_DIR])
    }

    /// Isolated runtime root
    pub fn runtime(&self) -> PathBuf {
        self.resolve([VENVS_DIR, TOOL_NAME])
    }

    /// Executable inside the runtime's `bin/` directory
    pub fn runtime_bin(&self, name: &str) -> PathBuf {
        self.resolve([VENVS_DIR, TOOL_NAME, "bin", name])
    }

    /// Runtime activation entry point
    pub fn runtime_activate(&self) -> PathBuf {
        self.runtime_bin("activate")
    }

    /// Shell completion hook installed alongside the tool
    pub fn completion_hook(&self) -> PathBuf {
        self.resolve([VENVS_DIR, TOOL_NAME, "share", TOOL_NAME, "kayobe-complete"])
    }

    /// Environment file within the config clone
    pub fn config_env_file(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.config_clone().join(relative)
    }

    /// Requirements manifest at the root of the config clone
    pub fn requirements_manifest(&self) -> PathBuf {
        self.config_clone().join(REQUIREMENTS_MANIFEST)
    }

    /// Tool configuration directory inside the config clone
    pub fn tool_config_dir(&self) -> PathBuf {
        self.resolve([SRC_DIR, CONFIG_CLONE_DIR, "etc", TOOL_NAME])
    }

    /// Generated activation script
    pub fn activation_script(&self) -> PathBuf {
        self.resolve([ACTIVATION_SCRIPT])
    }
}

/// Remove `.` and resolve `..` components without consulting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_layout() {
        let layout = EnvironmentLayout::new("/tmp/env1").unwrap();
        assert_eq!(layout.base(), Path::new("/tmp/env1"));
        assert_eq!(layout.tool_source(), PathBuf::from("/tmp/env1/src/kayobe"));
        assert_eq!(
            layout.config_clone(),
            PathBuf::from("/tmp/env1/src/kayobe-config")
        );
        assert_eq!(layout.runtime(), PathBuf::from("/tmp/env1/venvs/kayobe"));
        assert_eq!(
            layout.runtime_activate(),
            PathBuf::from("/tmp/env1/venvs/kayobe/bin/activate")
        );
        assert_eq!(
            layout.activation_script(),
            PathBuf::from("/tmp/env1/env-vars.sh")
        );
        assert_eq!(
            layout.tool_config_dir(),
            PathBuf::from("/tmp/env1/src/kayobe-config/etc/kayobe")
        );
        assert_eq!(
            layout.completion_hook(),
            PathBuf::from("/tmp/env1/venvs/kayobe/share/kayobe/kayobe-complete")
        );
    }

    #[test]
    fn test_resolve_joins_segments() {
        let layout = EnvironmentLayout::new("/srv/envs/a").unwrap();
        assert_eq!(
            layout.resolve(["src", "kayobe-config", "kayobe-env"]),
            PathBuf::from("/srv/envs/a/src/kayobe-config/kayobe-env")
        );
        assert_eq!(
            layout.resolve(Vec::<&str>::new()),
            PathBuf::from("/srv/envs/a")
        );
    }

    #[test]
    fn test_config_env_file_is_relative_to_config_clone() {
        let layout = EnvironmentLayout::new("/srv/env").unwrap();
        assert_eq!(
            layout.config_env_file("envs/kayobe-env"),
            PathBuf::from("/srv/env/src/kayobe-config/envs/kayobe-env")
        );
    }

    #[test]
    fn test_relative_base_is_made_absolute() {
        let layout = EnvironmentLayout::new("some-env").unwrap();
        assert!(layout.base().is_absolute());
        assert!(layout.base().ends_with("some-env"));
    }

    #[test]
    fn test_dot_components_are_normalized() {
        let layout = EnvironmentLayout::new("/tmp/./a/../env1/").unwrap();
        assert_eq!(layout.base(), Path::new("/tmp/env1"));
    }

    #[test]
    fn test_empty_base_rejected() {
        let err = EnvironmentLayout::new("").unwrap_err();
        assert!(matches!(
            err,
            crate::errors::BeokayError::Path(PathError::Invalid { .. })
        ));
    }

    #[test]
    fn test_root_base_rejected() {
        assert!(EnvironmentLayout::new("/").is_err());
        assert!(EnvironmentLayout::new("/tmp/..").is_err());
    }
}
