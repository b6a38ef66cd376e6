use crate::Context;
use crate::cli::EntrypointsArgs;
use crate::commands::repository;
use crate::report::entrypoint_label;
use crate::ui;
use anyhow::{Context as _, Result};
use repocache::Reference;
use std::process::ExitCode;

pub fn run(ctx: &Context, args: EntrypointsArgs) -> Result<ExitCode> {
    let repo = repository(ctx, &args.repo, args.cache_dir.as_deref())?;
    let matchers = ctx.config.matchers()?;
    let reference = Reference::parse(&args.reference);

    let tree = repo
        .checkout(&reference, &ctx.cancel)
        .with_context(|| format!("Failed to check out {reference}"))?;
    let found = entrypoint::discover(&tree.path, &matchers);
    let commit = tree.commit.clone();
    if let Err(e) = tree.remove() {
        ui::warn(&e.to_string());
    }
    let found = found.context("Entrypoint discovery failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&found).context("Failed to serialize entrypoints")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    ui::header(&format!("Entrypoints at {reference} ({})", short(&commit)));
    if found.is_empty() {
        ui::dim("None found");
    }
    for ep in &found {
        println!("  {}", entrypoint_label(ep));
        if ctx.verbose > 0 {
            for (key, value) in &ep.context {
                ui::kv(&format!("  {key}"), &value.to_string());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn short(commit: &str) -> &str {
    &commit[..commit.len().min(12)]
}
