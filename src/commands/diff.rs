use crate::Context;
use crate::cli::DiffArgs;
use crate::commands::repository;
use crate::report;
use crate::ui;
use anyhow::{Context as _, Result};
use orchestrator::{DiffOutcome, Differ, State};
use renderers::{Toolchain, default_registry};
use repocache::Reference;
use std::process::ExitCode;
use std::sync::Arc;

pub fn run(ctx: &Context, args: DiffArgs) -> Result<ExitCode> {
    let pre_repo = Arc::new(repository(ctx, &args.repo, args.cache_dir.as_deref())?);
    let post_repo = match &args.to_repo {
        Some(url) if url != &args.repo => {
            Arc::new(repository(ctx, url, args.cache_dir.as_deref())?)
        }
        _ => Arc::clone(&pre_repo),
    };

    let toolchain = Toolchain::discover(&ctx.config.toolchain());
    for tool in toolchain.missing() {
        log::debug!("{tool} not found; entrypoints that need it will fail");
    }

    let matchers = ctx.config.matchers()?;
    let mut differ = Differ::new(
        pre_repo,
        post_repo,
        matchers,
        default_registry(Arc::new(toolchain)),
    )
    .keep_worktrees(args.keep_worktrees || ctx.config.cache.keep_worktrees);
    if let Some(jobs) = args.jobs.or(ctx.config.cache.jobs) {
        differ = differ.jobs(jobs);
    }

    let from = Reference::parse(&args.from);
    let to = Reference::parse(&args.to);
    if !ctx.quiet && !args.json {
        ui::info(&format!("Diffing {} → {}", from, to));
    }

    let outcome = differ.diff(&from, &to, &ctx.cancel)?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome.diffs)
            .context("Failed to serialize diff")?;
        println!("{json}");
    } else {
        print!("{}", report::render(&outcome));
    }

    Ok(finish(ctx, &outcome))
}

/// Report cleanup warnings and errors; the exit code follows the state.
fn finish(ctx: &Context, outcome: &DiffOutcome) -> ExitCode {
    for error in &outcome.cleanup_errors {
        ui::warn(&error.to_string());
    }

    match outcome.state() {
        State::Done => {
            if !ctx.quiet && !outcome.summary().has_changes() {
                log::info!("No changes");
            }
            ExitCode::SUCCESS
        }
        State::DoneWithErrors => {
            for error in &outcome.errors {
                ui::error(&error.to_string());
            }
            ExitCode::FAILURE
        }
    }
}
