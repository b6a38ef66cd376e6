pub mod config;
pub mod diff;
pub mod entrypoints;

use crate::Context;
use crate::paths;
use anyhow::Result;
use repocache::{LogProgress, RepositorySpec};
use std::path::Path;
use std::sync::Arc;

/// Repository handle for `url`, with credentials and cache root from the
/// configuration unless overridden on the command line.
pub fn repository(ctx: &Context, url: &str, cache_dir: Option<&Path>) -> Result<RepositorySpec> {
    let env_cache = std::env::var(paths::ENV_CACHE_DIR).ok();
    let cache_root = paths::cache_dir(
        cache_dir,
        env_cache.as_deref(),
        ctx.config.cache.dir.as_deref(),
    )?;
    let credentials = ctx
        .config
        .credentials
        .resolve(|var| std::env::var(var).ok())?;

    log::debug!("Cache root: {}", cache_root.display());
    Ok(RepositorySpec::new(url, credentials)
        .cache_root(cache_root)
        .progress(Arc::new(LogProgress)))
}
