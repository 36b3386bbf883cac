#![allow(clippy::enum_variant_names)]

use std::process;

use clap::Parser as _;
use tracing::debug;

use crate::{
    application::{Application, ApplicationError},
    cli::Cli,
};

mod application;
mod cli;
mod comparison;
mod ext;
mod filesystem;

#[snafu::report]
fn main() -> Result<(), ApplicationError> {
    let cli_args = parse_cli();
    setup_tracing(&cli_args);
    debug!("Parsed CLI arguments: {cli_args:?}");

    Application::run(cli_args)?;

    Ok(())
}

/// Usage errors exit with status 1; help and version output keep clap's
/// behaviour.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli_args) => cli_args,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            process::exit(1);
        }
        Err(err) => err.exit(),
    }
}

fn setup_tracing(cli_args: &Cli) {
    if let Some(level) = cli_args.log_level.to_tracing_level() {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .without_time()
            .compact()
            .init();
    }
}
