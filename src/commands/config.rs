use crate::Context;
use crate::paths;
use crate::ui;
use anyhow::Result;
use renderers::{Tool, Toolchain};

pub fn run(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    ui::header("Configuration");
    let state = if ctx.config_path.exists() {
        ""
    } else {
        " (not found, using defaults)"
    };
    ui::kv(
        "File",
        &format!("{}{state}", ctx.config_path.display()),
    );

    let env_cache = std::env::var(paths::ENV_CACHE_DIR).ok();
    let cache = paths::cache_dir(None, env_cache.as_deref(), config.cache.dir.as_deref())?;
    ui::kv("Cache directory", &cache.display().to_string());
    ui::kv("Keep worktrees", &config.cache.keep_worktrees.to_string());
    ui::kv(
        "Jobs",
        &config
            .cache
            .jobs
            .map_or_else(|| "auto".to_string(), |j| j.to_string()),
    );

    let auth = match (&config.credentials.token_env, &config.credentials.ssh_key) {
        (Some(var), _) => format!("token from ${var}"),
        (None, Some(key)) => format!("ssh key {}", paths::expand(key).display()),
        (None, None) => "none".to_string(),
    };
    ui::kv("Credentials", &auth);

    ui::section("Matchers");
    for matcher in &config.matchers {
        let kind = matcher
            .entrypoint_type
            .map_or_else(|| "from capture".to_string(), |t| t.to_string());
        ui::kv(&kind, &matcher.pattern);
    }
    if config.automatic {
        ui::kv("automatic", "every supported type");
    }

    ui::section("Tools");
    let toolchain = Toolchain::discover(&config.toolchain());
    for tool in Tool::ALL {
        match toolchain.path(tool) {
            Some(path) => ui::success(&format!("{tool}: {}", path.display())),
            None => ui::warn(&format!("{tool}: not found")),
        }
    }

    Ok(())
}
