//! Thin wrappers over the `git` executable.

use crate::error::{Error, Result};
use crate::types::Credentials;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use runner::{CancelToken, Cmd};
use std::path::Path;

/// A `git` command with prompts disabled and credentials injected.
pub(crate) fn git(credentials: &Credentials) -> Cmd {
    let cmd = Cmd::new("git").env("GIT_TERMINAL_PROMPT", "0");
    match credentials {
        Credentials::None => cmd,
        Credentials::Token { username, token } => {
            let basic = STANDARD.encode(format!("{username}:{token}"));
            cmd.env("GIT_CONFIG_COUNT", "1")
                .env("GIT_CONFIG_KEY_0", "http.extraHeader")
                .env("GIT_CONFIG_VALUE_0", format!("Authorization: Basic {basic}"))
        }
        Credentials::SshKey { path } => cmd.env(
            "GIT_SSH_COMMAND",
            format!(
                "ssh -i '{}' -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
                path.display()
            ),
        ),
    }
}

/// A `git` command operating on a bare repository.
pub(crate) fn git_dir(credentials: &Credentials, dir: &Path) -> Cmd {
    git(credentials).arg("--git-dir").arg(dir)
}

/// Whether `dir` holds a usable bare repository.
pub(crate) fn is_bare_repository(dir: &Path, cancel: &CancelToken) -> bool {
    git_dir(&Credentials::None, dir)
        .args(["rev-parse", "--is-bare-repository"])
        .run_checked(cancel)
        .is_ok_and(|out| out == "true")
}

/// Resolve `rev` to a full commit hash, or `None` if it does not exist.
pub(crate) fn rev_parse_commit(
    mirror: &Path,
    rev: &str,
    cancel: &CancelToken,
) -> Result<Option<String>> {
    let output = git_dir(&Credentials::None, mirror)
        .args(["rev-parse", "--verify", "--quiet"])
        .arg(format!("{rev}^{{commit}}"))
        .output(cancel)?;
    if output.success() {
        Ok(Some(output.stdout_str()))
    } else if output.stderr.is_empty() || output.status.code() == Some(1) {
        Ok(None)
    } else {
        Err(Error::from_git_output(
            &format!("git rev-parse {rev}"),
            &output.stderr_str(),
        ))
    }
}

/// `file://` URL for a local repository path.
pub(crate) fn file_url(path: &Path) -> String {
    let display = path.display().to_string().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{display}")
    } else {
        format!("file:///{display}")
    }
}
