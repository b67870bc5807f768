//! `ffm` command-line entry point.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use file_automation::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, args.command.name());
    let log = Arc::new(logging::Logger::new(args.command.name()));

    match args.command {
        cli::Command::Run(opts) => commands::run::run(&args.global, &opts, &log),
        cli::Command::Check(opts) => commands::check::run(&args.global, &opts, &log),
        cli::Command::Version => {
            let version = option_env!("FFM_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            #[allow(clippy::print_stdout)]
            {
                println!("ffm {version}");
            }
            Ok(())
        }
    }
}
