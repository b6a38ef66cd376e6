//! Command builder with captured output and cancellation.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

/// How often a running child is checked for exit and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Output {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Standard output decoded lossily and trimmed.
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    /// Standard error decoded lossily and trimmed.
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// An external command to run.
///
/// Environment variables set through [`Cmd::env`] never appear in
/// [`Cmd::display`], so secrets may be passed that way.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (key, value) in vars {
            self = self.env(key, value);
        }
        self
    }

    /// Program and arguments joined for messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    /// Run to completion and capture output.
    ///
    /// A non-zero exit is not an error here; see [`Cmd::run_checked`].
    pub fn output(&self, cancel: &CancelToken) -> Result<Output> {
        cancel.check()?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }

        log::debug!("running: {}", self.display());
        let mut child = command.spawn().map_err(|source| Error::Spawn {
            command: self.display(),
            source,
        })?;

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        // On cancellation the reader threads are detached: grandchildren may
        // still hold the pipes open.
        let status = wait(&mut child, cancel)?;

        Ok(Output {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }

    /// Run and return trimmed stdout, failing on a non-zero exit.
    pub fn run_checked(&self, cancel: &CancelToken) -> Result<String> {
        let output = self.output(cancel)?;
        if output.success() {
            Ok(output.stdout_str())
        } else {
            Err(Error::Failed {
                command: self.display(),
                status: output.status.to_string(),
                stderr: output.stderr_str(),
            })
        }
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn wait(child: &mut Child, cancel: &CancelToken) -> Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if cancel.is_cancelled() {
            log::debug!("cancelling child process {}", child.id());
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Cancelled);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_display_joins_program_and_args() {
        let cmd = Cmd::new("git").args(["fetch", "--depth", "1"]);
        assert_eq!(cmd.display(), "git fetch --depth 1");
    }

    #[test]
    fn test_display_hides_env() {
        let cmd = Cmd::new("git").arg("fetch").env("SECRET", "hunter2");
        assert!(!cmd.display().contains("hunter2"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_checked_captures_stdout() {
        let out = Cmd::new("sh")
            .args(["-c", "echo hello"])
            .run_checked(&CancelToken::new())
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_checked_reports_stderr_on_failure() {
        let err = Cmd::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .run_checked(&CancelToken::new())
            .unwrap_err();
        assert_eq!(err.stderr(), Some("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn test_env_and_current_dir_applied() {
        let dir = tempfile::tempdir().unwrap();
        let out = Cmd::new("sh")
            .args(["-c", "echo $GREETING; pwd"])
            .env("GREETING", "hi")
            .current_dir(dir.path())
            .run_checked(&CancelToken::new())
            .unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("hi"));
        let pwd = std::fs::canonicalize(lines.next().unwrap()).unwrap();
        assert_eq!(pwd, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = Cmd::new("git").arg("--version").output(&cancel).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_running_child() {
        let cancel = CancelToken::with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let err = Cmd::new("sh")
            .args(["-c", "exec sleep 30"])
            .output(&cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = Cmd::new("definitely-not-a-real-binary-xyz")
            .output(&CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
