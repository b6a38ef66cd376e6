//! The per-repository mirror cache.

use crate::error::{Error, Result};
use crate::git::{file_url, git, git_dir, is_bare_repository, rev_parse_commit};
use crate::retry::{LogCallback, RetryCallback, with_retry};
use crate::types::{Credentials, ProgressSink, Reference, ResolvedRef, RetryConfig, Worktree};
use fs2::FileExt;
use runner::CancelToken;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

const MIRROR_DIR: &str = ".root";
const LOCK_FILE: &str = ".lock";

/// A remote repository and its local mirror.
///
/// One instance should be shared by every task that touches the same
/// remote. Mirror creation, fetches and ref writes are serialized by an
/// internal mutex plus an on-disk lock; checkouts proceed in parallel.
pub struct RepositorySpec {
    url: String,
    credentials: Credentials,
    cache_root: PathBuf,
    retry: RetryConfig,
    progress: Option<Arc<dyn ProgressSink>>,
    mirror: Mutex<Option<PathBuf>>,
}

impl std::fmt::Debug for RepositorySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositorySpec")
            .field("url", &self.url)
            .field("credentials", &self.credentials)
            .field("cache_root", &self.cache_root)
            .finish_non_exhaustive()
    }
}

impl RepositorySpec {
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            cache_root: default_cache_root(),
            retry: RetryConfig::default(),
            progress: None,
            mirror: Mutex::new(None),
        }
    }

    /// Directory under which mirrors and worktrees are created.
    pub fn cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `<cache_root>/<slug(url)>`
    pub fn clone_directory(&self) -> PathBuf {
        self.cache_root.join(slug(&self.url))
    }

    /// Location of the bare mirror.
    pub fn mirror_path(&self) -> PathBuf {
        self.clone_directory().join(MIRROR_DIR)
    }

    /// Create or refresh the local mirror.
    ///
    /// The first call in a process clones (or fetches, if a valid mirror is
    /// already on disk). Later calls return the cached handle without any
    /// network round trip.
    pub fn open(&self, cancel: &CancelToken) -> Result<PathBuf> {
        let mut guard = self.mirror.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = guard.as_ref() {
            return Ok(path.clone());
        }
        cancel.check()?;

        let path = self.sync_mirror(cancel)?;
        *guard = Some(path.clone());
        Ok(path)
    }

    /// Resolve a reference against the mirror and pin the commit.
    ///
    /// The pin (`refs/pinned/<hash>`) keeps the commit reachable even if a
    /// later fetch moves or deletes the branch.
    pub fn resolve(&self, reference: &Reference, cancel: &CancelToken) -> Result<ResolvedRef> {
        let mirror = self.open(cancel)?;
        let _guard = self.mirror.lock().unwrap_or_else(PoisonError::into_inner);
        cancel.check()?;

        let candidates: Vec<String> = match reference {
            Reference::Branch(name) => vec![
                format!("refs/heads/{name}"),
                format!("refs/tags/{name}"),
                name.clone(),
            ],
            Reference::Commit(hash) => vec![hash.clone()],
        };

        let mut commit = None;
        for candidate in &candidates {
            if let Some(hash) = rev_parse_commit(&mirror, candidate, cancel)? {
                commit = Some(hash);
                break;
            }
        }
        let commit = commit.ok_or_else(|| Error::ReferenceNotFound {
            reference: reference.to_string(),
        })?;

        git_dir(&Credentials::None, &mirror)
            .args(["update-ref", &format!("refs/pinned/{commit}"), &commit])
            .run_checked(cancel)?;

        log::debug!("resolved {} in {} to {}", reference, self.url, commit);
        Ok(ResolvedRef {
            reference: reference.clone(),
            commit,
        })
    }

    /// Materialize an isolated working tree for `reference`.
    ///
    /// The tree lives at `<clone_directory>/<short-hash>/<uuid>` and is
    /// populated from the local mirror only.
    pub fn checkout(&self, reference: &Reference, cancel: &CancelToken) -> Result<Worktree> {
        let mirror = self.open(cancel)?;
        let resolved = self.resolve(reference, cancel)?;

        let path = self
            .clone_directory()
            .join(resolved.short())
            .join(Uuid::new_v4().to_string());
        self.report(&format!("checking out {} ({})", reference, resolved.short()));

        fs::create_dir_all(&path).map_err(|e| Error::Worktree {
            path: path.clone(),
            message: e.to_string(),
        })?;

        if let Err(e) = populate_worktree(&path, &mirror, &resolved.commit, cancel) {
            if let Err(cleanup) = fs::remove_dir_all(&path) {
                log::warn!(
                    "failed to remove partial worktree {}: {}",
                    path.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        Ok(Worktree {
            path,
            commit: resolved.commit,
            reference: reference.clone(),
        })
    }

    fn sync_mirror(&self, cancel: &CancelToken) -> Result<PathBuf> {
        let root = self.clone_directory();
        fs::create_dir_all(&root)?;
        let root = std::path::absolute(&root)?;
        let mirror = root.join(MIRROR_DIR);

        let lock_path = root.join(LOCK_FILE);
        let lock_file = fs::File::create(&lock_path).map_err(|source| Error::Lock {
            path: lock_path.clone(),
            source,
        })?;
        lock_file.lock_exclusive().map_err(|source| Error::Lock {
            path: lock_path.clone(),
            source,
        })?;

        let result = self.clone_or_fetch(&mirror, cancel);

        let _ = lock_file.unlock();
        result.map(|()| mirror)
    }

    fn clone_or_fetch(&self, mirror: &Path, cancel: &CancelToken) -> Result<()> {
        if mirror.exists() {
            if is_bare_repository(mirror, cancel) {
                self.report(&format!("fetching {}", self.url));
                return with_retry(&self.retry, cancel, Some(self as &dyn RetryCallback), || {
                    self.fetch(mirror, cancel)
                });
            }
            log::warn!(
                "mirror at {} is not a valid repository, recloning",
                mirror.display()
            );
            fs::remove_dir_all(mirror)?;
        }

        self.report(&format!("cloning {}", self.url));
        with_retry(&self.retry, cancel, Some(self as &dyn RetryCallback), || {
            let result = self.clone_mirror(mirror, cancel);
            if result.is_err() && mirror.exists() {
                let _ = fs::remove_dir_all(mirror);
            }
            result
        })?;

        git_dir(&Credentials::None, mirror)
            .args(["config", "uploadpack.allowAnySHA1InWant", "true"])
            .run_checked(cancel)?;
        Ok(())
    }

    fn clone_mirror(&self, mirror: &Path, cancel: &CancelToken) -> Result<()> {
        git(&self.credentials)
            .args(["clone", "--mirror", "--quiet", &self.url])
            .arg(mirror)
            .run_checked(cancel)?;
        Ok(())
    }

    fn fetch(&self, mirror: &Path, cancel: &CancelToken) -> Result<()> {
        // Explicit refspecs keep --prune away from refs/pinned.
        git_dir(&self.credentials, mirror)
            .args([
                "fetch",
                "--quiet",
                "--prune",
                "--force",
                &self.url,
                "+refs/heads/*:refs/heads/*",
                "+refs/tags/*:refs/tags/*",
            ])
            .run_checked(cancel)?;
        Ok(())
    }

    fn report(&self, message: &str) {
        log::debug!("{message}");
        if let Some(sink) = &self.progress {
            sink.on_progress(message);
        }
    }
}

impl RetryCallback for RepositorySpec {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration) {
        LogCallback.on_retry(attempt, max_attempts, error, delay);
        self.report(&format!(
            "attempt {attempt}/{max_attempts} for {} failed, retrying in {}s",
            self.url,
            delay.as_secs()
        ));
    }
}

fn populate_worktree(path: &Path, mirror: &Path, commit: &str, cancel: &CancelToken) -> Result<()> {
    let none = Credentials::None;
    git(&none)
        .args(["-c", "init.defaultBranch=main", "init", "--quiet"])
        .arg(path)
        .run_checked(cancel)?;
    git(&none)
        .arg("-C")
        .arg(path)
        .args(["fetch", "--quiet", "--depth", "1", &file_url(mirror), commit])
        .run_checked(cancel)?;
    git(&none)
        .arg("-C")
        .arg(path)
        .args(["checkout", "--quiet", "--detach", "FETCH_HEAD"])
        .run_checked(cancel)?;
    Ok(())
}

fn default_cache_root() -> PathBuf {
    std::env::temp_dir().join("gitops-diff")
}

/// Deterministic, filesystem-safe name for a URL.
pub(crate) fn slug(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut dash = false;
    for c in url.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("repository");
    }
    out
}
