use std::io::{self, Write};
use std::path::{Path, PathBuf};

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::comparison::{CompareError, TreeComparator, TreeRenderer};
use crate::ext::BestEffortPathExt;

/// Depth of the first level below the `<root>` line.
const FIRST_LEVEL_DEPTH: usize = 1;

pub struct Application;

impl Application {
    pub fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        debug!("Runtime config: {:?}", app_config);

        colored::control::set_override(app_config.colorize);
        let report = Self::report(&app_config)?;

        let mut stdout = io::stdout().lock();
        stdout
            .write_all(&report)
            .and_then(|()| stdout.flush())
            .context(OutputSnafu)?;

        Ok(())
    }

    /// Builds the full text report in memory, so a failed comparison leaves
    /// stdout untouched.
    pub fn report(app_config: &RuntimeConfig) -> Result<Vec<u8>, ApplicationError> {
        ensure_directory(&app_config.dir_a, "A")?;
        ensure_directory(&app_config.dir_b, "B")?;

        let comparator = TreeComparator::new(app_config.compare_options);
        let renderer = TreeRenderer::new(app_config.colorize);

        let mut report = Vec::new();
        renderer.write_root(&mut report).context(OutputSnafu)?;
        let differences = comparator
            .compare_tree(
                &app_config.dir_a,
                &app_config.dir_b,
                FIRST_LEVEL_DEPTH,
                &renderer,
                &mut report,
            )
            .context(ComparisonSnafu)?;
        info!("Found {} difference(s)", differences);

        Ok(report)
    }
}

fn ensure_directory(path: &Path, label: &'static str) -> Result<(), ApplicationError> {
    ensure!(
        path.is_dir(),
        NotADirectorySnafu {
            label,
            path: path.to_path_buf(),
        }
    );
    Ok(())
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Path {label} must be a directory: {}", path.best_effort_path_display()))]
    NotADirectoryError { label: &'static str, path: PathBuf },
    #[snafu(display("Critical failure encountered while comparing the directories"))]
    ComparisonError { source: CompareError },
    #[snafu(display("Failed to write the report to stdout"))]
    OutputError { source: std::io::Error },
}
