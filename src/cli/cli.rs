use std::path::PathBuf;

use clap::Parser;

use crate::application::data::{ColorMode, LogLevel};

/// Reports every structural or content difference between two directory trees.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// First directory to compare
    pub dir_a: PathBuf,
    /// Second directory to compare
    pub dir_b: PathBuf,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Report subdirectories that cannot be listed and carry on with the rest
    #[clap(long, short)]
    pub keep_going: bool,

    #[clap(long, default_value = "auto", value_enum)]
    pub color: ColorMode,
}
