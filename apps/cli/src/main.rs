#![allow(clippy::print_stderr, clippy::print_stdout)]

mod args;
mod check;
mod summary;

use crate::args::{Cli, Commands};
use anyhow::Result;
use clap::Parser;
use mapr_logger::{Logger, level_for_verbosity};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _logger = Logger::builder()
        .name(env!("CARGO_PKG_NAME"))
        .level(level_for_verbosity(cli.verbose))
        .init()?;

    match &cli.command {
        Commands::Check(args) => check::run(args),
    }
}
