//! The diff state machine.
//!
//! `Start -> CheckoutBoth -> DiscoverEntrypoints -> FanOutPerEntrypoint ->
//! Join -> Done | DoneWithErrors`

use crate::error::{Error, JoinedError, Result, Side};
use crate::outcome::{DiffOutcome, EntrypointDiff};
use entrypoint::{Entrypoint, Matcher, discover};
use rayon::prelude::*;
use repocache::{Reference, RepositorySpec, Worktree};
use resource::{OriginContext, RendererRegistry, SideContext};
use runner::CancelToken;
use std::collections::HashSet;
use std::sync::Arc;

/// Diffs two references of a repository (or of two repositories).
pub struct Differ {
    pre_repo: Arc<RepositorySpec>,
    post_repo: Arc<RepositorySpec>,
    matchers: Vec<Box<dyn Matcher>>,
    registry: RendererRegistry,
    jobs: usize,
    keep_worktrees: bool,
}

impl std::fmt::Debug for Differ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Differ")
            .field("pre_repo", &self.pre_repo.url())
            .field("post_repo", &self.post_repo.url())
            .field("matchers", &self.matchers.len())
            .field("registry", &self.registry)
            .field("jobs", &self.jobs)
            .field("keep_worktrees", &self.keep_worktrees)
            .finish()
    }
}

impl Differ {
    pub fn new(
        pre_repo: Arc<RepositorySpec>,
        post_repo: Arc<RepositorySpec>,
        matchers: Vec<Box<dyn Matcher>>,
        registry: RendererRegistry,
    ) -> Self {
        Self {
            pre_repo,
            post_repo,
            matchers,
            registry,
            jobs: default_jobs(),
            keep_worktrees: false,
        }
    }

    /// Both sides come from the same repository and share its mirror.
    pub fn for_repository(
        repo: Arc<RepositorySpec>,
        matchers: Vec<Box<dyn Matcher>>,
        registry: RendererRegistry,
    ) -> Self {
        Self::new(Arc::clone(&repo), repo, matchers, registry)
    }

    /// Number of entrypoints diffed at once.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Leave both worktrees on disk after the diff.
    pub fn keep_worktrees(mut self, keep: bool) -> Self {
        self.keep_worktrees = keep;
        self
    }

    /// Diff `from` (pre) against `to` (post).
    ///
    /// Returns `Err` only when nothing can be diffed: a checkout, discovery
    /// or pool failure, or cancellation before any work. Entrypoint
    /// failures are reported in the outcome.
    pub fn diff(&self, from: &Reference, to: &Reference, cancel: &CancelToken) -> Result<DiffOutcome> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled.into());
        }

        log::info!("checking out {from} and {to}");
        let (pre, post) = self.checkout_both(from, to, cancel)?;

        let result = self.diff_trees(&pre, &post, from, to, cancel);

        let mut cleanup_errors = Vec::new();
        if self.keep_worktrees {
            log::info!(
                "keeping worktrees {} and {}",
                pre.path.display(),
                post.path.display()
            );
        } else {
            for worktree in [pre, post] {
                if let Err(e) = worktree.remove() {
                    log::warn!("{e}");
                    cleanup_errors.push(e);
                }
            }
        }

        let mut outcome = result?;
        outcome.cleanup_errors = cleanup_errors;
        Ok(outcome)
    }

    fn checkout_both(
        &self,
        from: &Reference,
        to: &Reference,
        cancel: &CancelToken,
    ) -> Result<(Worktree, Worktree)> {
        let (pre, post) = rayon::join(
            || self.pre_repo.checkout(from, cancel),
            || self.post_repo.checkout(to, cancel),
        );

        match (pre, post) {
            (Ok(pre), Ok(post)) => Ok((pre, post)),
            (pre, post) => {
                let mut errors = Vec::new();
                for (side, reference, result) in [(Side::Pre, from, pre), (Side::Post, to, post)] {
                    match result {
                        Ok(worktree) => {
                            if let Err(e) = worktree.remove() {
                                log::warn!("{e}");
                            }
                        }
                        Err(source) => errors.push(Error::Checkout {
                            side,
                            reference: reference.to_string(),
                            source,
                        }),
                    }
                }
                Err(JoinedError::new(errors))
            }
        }
    }

    fn diff_trees(
        &self,
        pre: &Worktree,
        post: &Worktree,
        from: &Reference,
        to: &Reference,
        cancel: &CancelToken,
    ) -> Result<DiffOutcome> {
        log::info!("discovering entrypoints");
        let (pre_eps, post_eps) = rayon::join(
            || discover(&pre.path, &self.matchers),
            || discover(&post.path, &self.matchers),
        );
        let (pre_eps, post_eps) = match (pre_eps, post_eps) {
            (Ok(pre_eps), Ok(post_eps)) => (pre_eps, post_eps),
            (pre_eps, post_eps) => {
                let errors = [(Side::Pre, pre_eps), (Side::Post, post_eps)]
                    .into_iter()
                    .filter_map(|(side, result)| {
                        result.err().map(|source| Error::Discover { side, source })
                    })
                    .collect();
                return Err(JoinedError::new(errors));
            }
        };

        let entrypoints = union_by_directory(pre_eps, post_eps);
        log::info!(
            "diffing {} entrypoint(s) with {} worker(s)",
            entrypoints.len(),
            self.jobs
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| Error::Pool(e.to_string()))?;

        let pre_side = SideContext::new(self.pre_repo.url(), from.label());
        let post_side = SideContext::new(self.post_repo.url(), to.label());

        let results: Vec<(EntrypointDiff, Vec<Error>)> = pool.install(|| {
            entrypoints
                .par_iter()
                .map(|ep| {
                    let ctx = OriginContext {
                        directory: ep.directory.clone(),
                        pre: pre_side.clone(),
                        post: post_side.clone(),
                    };
                    self.diff_entrypoint(ep, pre, post, &ctx, cancel)
                })
                .collect()
        });

        let mut outcome = DiffOutcome::default();
        for (diff, errors) in results {
            outcome.diffs.push(diff);
            outcome.errors.extend(errors);
        }
        if outcome.errors.is_empty() {
            log::info!("done");
        } else {
            log::info!("done with {} error(s)", outcome.errors.len());
        }
        Ok(outcome)
    }

    /// Render both sides concurrently, wait for both, then diff.
    fn diff_entrypoint(
        &self,
        ep: &Entrypoint,
        pre: &Worktree,
        post: &Worktree,
        ctx: &OriginContext,
        cancel: &CancelToken,
    ) -> (EntrypointDiff, Vec<Error>) {
        if cancel.is_cancelled() {
            return errored(ep, vec![Error::Cancelled]);
        }

        let renderer = match self.registry.get(ep.entrypoint_type) {
            Ok(renderer) => renderer,
            Err(source) => {
                let error = Error::Renderer {
                    entrypoint: ep.directory.clone(),
                    source,
                };
                return errored(ep, vec![error]);
            }
        };

        log::debug!("rendering {} ({})", ep.directory, ep.entrypoint_type);
        // Pre renders on its own thread so both sides overlap even when
        // every pool worker is busy.
        let (pre_set, post_set) = std::thread::scope(|scope| {
            let pre_render = scope.spawn(|| renderer.render(&pre.path, ep, cancel));
            let post_set = renderer.render(&post.path, ep, cancel);
            match pre_render.join() {
                Ok(pre_set) => (pre_set, post_set),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        });

        match (pre_set, post_set) {
            (Ok(pre_set), Ok(post_set)) => {
                let changes = resource::diff(Some(&pre_set), Some(&post_set), ctx);
                log::debug!("{}: {} change(s)", ep.directory, changes.len());
                let diff = EntrypointDiff {
                    entrypoint: ep.clone(),
                    changes,
                    error: None,
                };
                (diff, Vec::new())
            }
            (pre_set, post_set) => {
                let errors = [(Side::Pre, pre_set), (Side::Post, post_set)]
                    .into_iter()
                    .filter_map(|(side, result)| {
                        result.err().map(|source| Error::Render {
                            entrypoint: ep.directory.clone(),
                            side,
                            source,
                        })
                    })
                    .collect();
                errored(ep, errors)
            }
        }
    }
}

/// An entrypoint result carrying `errors`, which are also handed back for
/// the operation-wide list.
fn errored(ep: &Entrypoint, errors: Vec<Error>) -> (EntrypointDiff, Vec<Error>) {
    for e in &errors {
        log::warn!("{e}");
    }
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    let diff = EntrypointDiff {
        entrypoint: ep.clone(),
        changes: Vec::new(),
        error: Some(message),
    };
    (diff, errors)
}

/// Every pre entrypoint, then post entrypoints whose directory is new.
pub fn union_by_directory(pre: Vec<Entrypoint>, post: Vec<Entrypoint>) -> Vec<Entrypoint> {
    let mut seen: HashSet<String> = pre.iter().map(|ep| ep.directory.clone()).collect();
    let mut union = pre;
    for ep in post {
        if seen.insert(ep.directory.clone()) {
            union.push(ep);
        }
    }
    union
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}
