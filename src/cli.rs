//! Command-line argument model.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the file automation runner.
#[derive(Parser, Debug)]
#[command(
    name = "ffm",
    about = "Run shell commands on files matched by glob, extension, keyword and age",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Config file (defaults to the path in $`FFM_CONFIG`)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Render commands without running them
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process every target once, or repeatedly with --loop
    Run(RunOpts),
    /// Validate the config and show the resolved targets
    Check(CheckOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Check(_) => "check",
            Self::Version => "version",
        }
    }
}

/// Options for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunOpts {
    /// Repeat every N seconds, reloading the config each time (0 runs once)
    #[arg(long = "loop", value_name = "SECONDS")]
    pub loop_secs: Option<u64>,
}

/// Options for the `check` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CheckOpts {
    /// Print the resolved targets as JSON
    #[arg(long)]
    pub json: bool,
}
