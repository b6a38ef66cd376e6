//! # repocache
//!
//! Materializes isolated working trees of a remote git repository without
//! re-fetching the remote for every request.
//!
//! Each [`RepositorySpec`] owns one bare mirror on disk under
//! `<cache_root>/<slug(url)>/.root`. The mirror is created or refreshed once
//! per process, and every later operation works from it:
//!
//! - [`RepositorySpec::open`] clones or fetches the mirror (serialized)
//! - [`RepositorySpec::resolve`] turns a [`Reference`] into a pinned commit
//! - [`RepositorySpec::checkout`] creates a fresh [`Worktree`] for a commit
//!   by fetching it from the local mirror, never from the remote
//!
//! Worktrees are exclusively owned by the caller and removed with
//! [`Worktree::remove`].
//!
//! ```no_run
//! use repocache::{Credentials, Reference, RepositorySpec};
//! use runner::CancelToken;
//!
//! let repo = RepositorySpec::new("https://github.com/org/infra.git", Credentials::None);
//! let cancel = CancelToken::new();
//! let tree = repo.checkout(&Reference::parse("main"), &cancel)?;
//! println!("{} at {}", tree.path.display(), tree.commit);
//! tree.remove()?;
//! # Ok::<(), repocache::Error>(())
//! ```

pub mod error;
mod git;
pub mod retry;
mod spec;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use spec::RepositorySpec;
pub use types::{
    Credentials, LogProgress, ProgressSink, Reference, ResolvedRef, RetryConfig, Worktree,
};
