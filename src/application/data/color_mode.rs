use std::io::{self, IsTerminal};

use clap::ValueEnum;
use supports_color::Stream;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Whether the report written to stdout should be coloured. Under `Auto`
    /// piped output stays plain even when `FORCE_COLOR` is set.
    pub fn colorize_stdout(&self) -> bool {
        match self {
            ColorMode::Auto => {
                io::stdout().is_terminal() && supports_color::on(Stream::Stdout).is_some()
            }
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}
