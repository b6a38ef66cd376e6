mod cli;
mod commands;
mod config;
mod paths;
mod report;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use runner::CancelToken;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config_path: PathBuf,
    pub config: Config,
    /// Fired by Ctrl-C
    pub cancel: CancelToken,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if let Command::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "gitops-diff", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let xdg = std::env::var("XDG_CONFIG_HOME").ok();
    let config_path = paths::config_file(cli.config.as_deref(), xdg.as_deref())?;
    let config = Config::load(&config_path)?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        log::warn!("Interrupted, cancelling");
        handler_token.cancel();
    })
    .context("Failed to install Ctrl-C handler")?;

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path,
        config,
        cancel,
    };

    match cli.command {
        Command::Diff(args) => commands::diff::run(&ctx, args),
        Command::Entrypoints(args) => commands::entrypoints::run(&ctx, args),
        Command::Config => commands::config::run(&ctx).map(|()| ExitCode::SUCCESS),
        Command::Completions { .. } => Ok(ExitCode::SUCCESS),
    }
}
