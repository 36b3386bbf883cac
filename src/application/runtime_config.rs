use std::path::PathBuf;

use crate::cli::Cli;
use crate::comparison::CompareOptions;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub dir_a: PathBuf,
    pub dir_b: PathBuf,
    pub compare_options: CompareOptions,
    pub colorize: bool,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            dir_a: cli.dir_a,
            dir_b: cli.dir_b,
            compare_options: CompareOptions {
                keep_going: cli.keep_going,
            },
            colorize: cli.color.colorize_stdout(),
        }
    }
}
