//! Runtime provisioning
//!
//! Creates a fresh Python virtual environment, upgrades its packaging
//! toolchain, then installs the automation tool into it either from a local
//! source checkout or from a requirements manifest. There is no in-place
//! upgrade: an existing incompatible runtime at the target makes creation fail.

use crate::errors::{ProvisionError, Result};
use crate::exec::{CommandRunner, Invocation};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Packages upgraded in a fresh runtime before the tool is installed
const BOOTSTRAP_PACKAGES: [&str; 3] = ["pip", "setuptools", "wheel"];

/// Where to install the tool from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    /// A local source checkout
    Local(PathBuf),
    /// A requirements manifest
    Requirements(PathBuf),
}

/// One runtime to provision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Runtime root (the virtualenv directory)
    pub runtime_path: PathBuf,
    /// Interpreter used to create the runtime
    pub interpreter: String,
    /// Tool installation source
    pub source: InstallSource,
}

impl ProvisionRequest {
    fn pip(&self) -> String {
        self.runtime_path
            .join("bin")
            .join("pip")
            .to_string_lossy()
            .into_owned()
    }

    /// The ordered provisioning steps, each labelled for error reporting.
    ///
    /// Every step runs from the directory holding the runtime.
    pub fn steps(&self) -> Vec<(&'static str, Invocation)> {
        let create = Invocation::new(&self.interpreter)
            .args(["-m", "venv"])
            .path_arg(&self.runtime_path);

        let upgrade = Invocation::new(self.pip())
            .args(["install", "--upgrade"])
            .args(BOOTSTRAP_PACKAGES);

        let install = match &self.source {
            InstallSource::Local(path) => Invocation::new(self.pip())
                .arg("install")
                .path_arg(path),
            InstallSource::Requirements(path) => Invocation::new(self.pip())
                .args(["install", "-r"])
                .path_arg(path),
        };

        [
            ("runtime creation", create),
            ("packaging upgrade", upgrade),
            ("tool installation", install),
        ]
        .into_iter()
        .map(|(label, inv)| (label, inv.in_parent_of(&self.runtime_path)))
        .collect()
    }
}

/// Create the runtime and install the tool into it.
#[instrument(skip(runner), fields(runtime = %request.runtime_path.display()))]
pub async fn provision(runner: &dyn CommandRunner, request: &ProvisionRequest) -> Result<()> {
    if let InstallSource::Requirements(manifest) = &request.source {
        if !manifest.is_file() {
            return Err(ProvisionError::MissingManifest {
                path: manifest.clone(),
            }
            .into());
        }
    }

    for (step, invocation) in request.steps() {
        info!("Provisioning runtime: {}", step);
        let outcome = runner
            .run(&invocation)
            .await
            .map_err(|source| ProvisionError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        if !outcome.is_success() {
            return Err(ProvisionError::Failed {
                step: step.to_string(),
                code: outcome.exit_code(),
            }
            .into());
        }
    }

    info!("Runtime ready at {}", request.runtime_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: InstallSource) -> ProvisionRequest {
        ProvisionRequest {
            runtime_path: PathBuf::from("/tmp/env1/venvs/kayobe"),
            interpreter: "python3".to_string(),
            source,
        }
    }

    #[test]
    fn test_steps_from_local_source() {
        let req = request(InstallSource::Local(PathBuf::from("/tmp/env1/src/kayobe")));
        let steps = req.steps();
        assert_eq!(steps.len(), 3);

        let argv: Vec<String> = steps.iter().map(|(_, inv)| inv.display()).collect();
        assert_eq!(argv[0], "python3 -m venv /tmp/env1/venvs/kayobe");
        assert_eq!(
            argv[1],
            "/tmp/env1/venvs/kayobe/bin/pip install --upgrade pip setuptools wheel"
        );
        assert_eq!(
            argv[2],
            "/tmp/env1/venvs/kayobe/bin/pip install /tmp/env1/src/kayobe"
        );
        for (_, inv) in &steps {
            assert_eq!(inv.cwd, Some(PathBuf::from("/tmp/env1/venvs")));
        }
    }

    #[test]
    fn test_steps_from_requirements() {
        let req = request(InstallSource::Requirements(PathBuf::from(
            "/tmp/env1/src/kayobe-config/requirements.txt",
        )));
        let (label, install) = &req.steps()[2];
        assert_eq!(*label, "tool installation");
        assert_eq!(
            install.args,
            vec![
                "install",
                "-r",
                "/tmp/env1/src/kayobe-config/requirements.txt"
            ]
        );
    }

    #[test]
    fn test_custom_interpreter() {
        let mut req = request(InstallSource::Local(PathBuf::from("/src")));
        req.interpreter = "/usr/bin/python3.11".to_string();
        assert_eq!(req.steps()[0].1.program, "/usr/bin/python3.11");
    }
}
