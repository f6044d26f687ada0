//! Shared fixtures for CLI integration tests
//!
//! Stand-in executables are small `/bin/sh` scripts that append one line per
//! invocation to the file named by `FAKE_LOG`, so tests can assert on what
//! the CLI launched without network access or a Python toolchain.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const FAKE_LOG_ENV: &str = "FAKE_LOG";

pub fn bash_available() -> bool {
    Path::new("/bin/bash").exists() && Path::new("/bin/sh").exists()
}

pub fn write_executable(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Lines of the shared invocation log, empty when nothing ran.
pub fn read_log(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// `PATH` with `dir` in front of the inherited search path.
pub fn path_with(dir: &Path) -> String {
    match std::env::var("PATH") {
        Ok(existing) => format!("{}:{}", dir.display(), existing),
        Err(_) => dir.display().to_string(),
    }
}

/// Install the contents of a provisioned runtime at `venv`: an activation
/// script that puts `venv/bin` on `PATH`, plus recording `pip` and `kayobe`.
pub fn install_fake_runtime(venv: &Path) {
    let bin = venv.join("bin");
    fs::create_dir_all(&bin).unwrap();
    fs::write(
        bin.join("activate"),
        format!("export PATH=\"{}:$PATH\"\n", bin.display()),
    )
    .unwrap();
    write_executable(
        &bin.join("pip"),
        "#!/bin/sh\necho \"pip $*\" >> \"$FAKE_LOG\"\n",
    );
    write_executable(
        &bin.join("kayobe"),
        "#!/bin/sh\n\
         echo \"kayobe $* vault=$KAYOBE_VAULT_PASSWORD env=$FAKE_CONFIG_ENV_ARGS\" >> \"$FAKE_LOG\"\n\
         exit \"${FAKE_KAYOBE_EXIT:-0}\"\n",
    );
}

/// Contents of a fresh kayobe-config clone at `clone`.
pub fn install_fake_config(clone: &Path) {
    fs::create_dir_all(clone.join(".git")).unwrap();
    fs::create_dir_all(clone.join("etc").join("kayobe")).unwrap();
    fs::write(
        clone.join("kayobe-env"),
        "export FAKE_CONFIG_ENV_ARGS=\"$*\"\n",
    )
    .unwrap();
    fs::write(clone.join("requirements.txt"), "kayobe\n").unwrap();
}

/// A complete environment under `base`, as `create` would leave it.
pub fn fake_environment(base: &Path) {
    install_fake_config(&base.join("src").join("kayobe-config"));
    install_fake_runtime(&base.join("venvs").join("kayobe"));
}

/// Stand-in `git` and `python3` that behave like a successful clone and
/// `-m venv`. Returns the directory holding them.
///
/// `git` exits with `FAKE_GIT_EXIT` when it is set.
pub fn fake_toolchain(dir: &Path) -> PathBuf {
    let bin = dir.join("fake-bin");

    write_executable(
        &bin.join("git"),
        "#!/bin/sh\n\
         echo \"git $*\" >> \"$FAKE_LOG\"\n\
         if [ -n \"$FAKE_GIT_EXIT\" ]; then exit \"$FAKE_GIT_EXIT\"; fi\n\
         [ \"$1\" = clone ] || exit 2\n\
         mkdir -p \"$3/.git\" \"$3/etc/kayobe\"\n\
         echo 'export FAKE_CONFIG_ENV_ARGS=\"$*\"' > \"$3/kayobe-env\"\n\
         echo kayobe > \"$3/requirements.txt\"\n",
    );

    write_executable(
        &bin.join("python3"),
        "#!/bin/sh\n\
         echo \"python $*\" >> \"$FAKE_LOG\"\n\
         venv=\"$3\"\n\
         mkdir -p \"$venv/bin\"\n\
         echo \"export PATH=\\\"$venv/bin:\\$PATH\\\"\" > \"$venv/bin/activate\"\n\
         printf '#!/bin/sh\\necho \"pip $*\" >> \"$FAKE_LOG\"\\n' > \"$venv/bin/pip\"\n\
         printf '#!/bin/sh\\necho \"kayobe $* vault=$KAYOBE_VAULT_PASSWORD env=$FAKE_CONFIG_ENV_ARGS\" >> \"$FAKE_LOG\"\\n' > \"$venv/bin/kayobe\"\n\
         chmod +x \"$venv/bin/pip\" \"$venv/bin/kayobe\"\n",
    );

    bin
}
