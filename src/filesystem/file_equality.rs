use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use snafu::{Report, ResultExt, Snafu};
use tracing::{debug, warn};

use crate::ext::BestEffortPathExt;

/// Both files are read in lock-step, one chunk of this size at a time.
const CHUNK_SIZE: usize = 8192;

/// Returns whether two regular files hold exactly the same bytes.
///
/// Any I/O failure is reported as "not identical". The underlying cause is
/// logged at warn level so it does not get lost entirely.
pub fn files_identical(path_a: &Path, path_b: &Path) -> bool {
    match compare_files(path_a, path_b) {
        Ok(identical) => identical,
        Err(err) => {
            warn!("{}; reporting the files as different", Report::from_error(err));
            false
        }
    }
}

/// Byte comparison that keeps the reason a file could not be read.
///
/// Files of different sizes are rejected without opening either of them, and
/// two empty files are identical without any read.
pub fn compare_files(path_a: &Path, path_b: &Path) -> Result<bool, FileEqualityError> {
    let size_a = file_size(path_a)?;
    let size_b = file_size(path_b)?;

    if size_a != size_b {
        debug!(
            "Size mismatch: {} has {size_a} bytes, {} has {size_b} bytes",
            path_a.display(),
            path_b.display()
        );
        return Ok(false);
    }
    if size_a == 0 {
        return Ok(true);
    }

    let mut file_a = File::open(path_a).context(OpenSnafu {
        path: path_a.to_path_buf(),
    })?;
    let mut file_b = File::open(path_b).context(OpenSnafu {
        path: path_b.to_path_buf(),
    })?;

    let mut buf_a = vec![0u8; CHUNK_SIZE];
    let mut buf_b = vec![0u8; CHUNK_SIZE];

    loop {
        let read_a = read_chunk(&mut file_a, &mut buf_a).context(ReadSnafu {
            path: path_a.to_path_buf(),
        })?;
        let read_b = read_chunk(&mut file_b, &mut buf_b).context(ReadSnafu {
            path: path_b.to_path_buf(),
        })?;

        if read_a != read_b || buf_a[..read_a] != buf_b[..read_b] {
            return Ok(false);
        }
        if read_a < CHUNK_SIZE {
            return Ok(true);
        }
    }
}

fn file_size(path: &Path) -> Result<u64, FileEqualityError> {
    fs::metadata(path)
        .map(|metadata| metadata.len())
        .context(MetadataSnafu {
            path: path.to_path_buf(),
        })
}

/// Fills `buf` unless the end of the stream comes first. A plain `read` may
/// return short even mid-file, which would desynchronise the two streams.
fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[derive(Debug, Snafu)]
pub enum FileEqualityError {
    #[snafu(display("Failed to read the size of {}", path.best_effort_path_display()))]
    MetadataError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to open {}", path.best_effort_path_display()))]
    OpenError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read from {}", path.best_effort_path_display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
}
