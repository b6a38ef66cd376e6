use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gitops-diff")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Resource-level diff between two states of an IaC repository", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ~/.config/gitops-diff/config.toml)
    #[arg(long, global = true, env = "GITOPS_DIFF_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff the rendered resources of two references
    Diff(DiffArgs),

    /// List the entrypoints found at a reference
    Entrypoints(EntrypointsArgs),

    /// Show the effective configuration and tool locations
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Repository URL or local path
    pub repo: String,

    /// Reference to diff from (branch, tag or commit)
    pub from: String,

    /// Reference to diff to (branch, tag or commit)
    pub to: String,

    /// Repository for the `to` side, when it differs from `repo`
    #[arg(long, value_name = "URL")]
    pub to_repo: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Leave the checked out worktrees on disk
    #[arg(long)]
    pub keep_worktrees: bool,

    /// Number of entrypoints diffed in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Directory for mirrors and worktrees
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct EntrypointsArgs {
    /// Repository URL or local path
    pub repo: String,

    /// Reference to inspect
    #[arg(default_value = "main")]
    pub reference: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory for mirrors and worktrees
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}
