#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! cpu — competitive programming utilities: contests, solutions, tests and checkers.

mod cli;
mod commands;
mod exec;
mod logging;
mod types;
mod workspace;

use std::path::PathBuf;

use clap::Parser;

use cli::{Cli, OutputCtx, write_error};
use commands::Session;
use types::ErrorOutput;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = logging::init_tracing(cli.verbose) {
        eprintln!("warning: logging disabled: {err}");
    }

    let ctx = OutputCtx::new(cli.output, cli.json, cli.no_header);
    let session = Session {
        out: &ctx,
        root: PathBuf::from("."),
        config_dir: workspace::config_dir(),
    };

    if let Err(err) = commands::dispatch(&cli.command, &session) {
        write_error(&ErrorOutput::from_cpu_error(&err), cli.output, cli.json);
        std::process::exit(err.exit_code());
    }
}
