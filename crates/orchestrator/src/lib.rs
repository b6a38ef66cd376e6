//! # orchestrator
//!
//! Runs a complete repository diff: both references are checked out
//! concurrently, entrypoints are discovered in each tree and unioned by
//! directory, then every entrypoint is rendered on both sides and diffed
//! on a bounded worker pool.
//!
//! Failures are joined, never replaced. A checkout or discovery failure
//! stops the operation; a render failure only marks its entrypoint.
//!
//! ```no_run
//! use entrypoint::{AutomaticMatcher, Matcher};
//! use orchestrator::Differ;
//! use renderers::{Toolchain, ToolchainConfig, default_registry};
//! use repocache::{Credentials, Reference, RepositorySpec};
//! use runner::CancelToken;
//! use std::sync::Arc;
//!
//! let repo = Arc::new(RepositorySpec::new(
//!     "https://github.com/example/infra.git",
//!     Credentials::None,
//! ));
//! let matchers: Vec<Box<dyn Matcher>> = vec![Box::new(AutomaticMatcher::default())];
//! let registry = default_registry(Arc::new(Toolchain::discover(&ToolchainConfig::default())));
//!
//! let outcome = Differ::for_repository(repo, matchers, registry).diff(
//!     &Reference::parse("main"),
//!     &Reference::parse("feature/db"),
//!     &CancelToken::new(),
//! )?;
//! for diff in &outcome.diffs {
//!     println!("{}: {} change(s)", diff.entrypoint.name, diff.changes.len());
//! }
//! # Ok::<(), orchestrator::JoinedError>(())
//! ```

pub mod differ;
pub mod error;
pub mod outcome;

pub use differ::{Differ, union_by_directory};
pub use error::{Error, JoinedError, Result, Side};
pub use outcome::{DiffOutcome, EntrypointDiff, State};
