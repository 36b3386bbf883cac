use std::collections::{BTreeSet, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use derive_more::Display;
use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::ext::BestEffortPathExt;

/// Whether a name refers to a directory or to anything else.
///
/// Anything that does not resolve to a directory counts as a file, including
/// names that do not exist at all on that side. Any other failure to stat the
/// path is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EntryKind {
    #[display("file")]
    File,
    #[display("dir")]
    Dir,
}

impl EntryKind {
    pub fn of(path: &Path) -> Result<Self, EntryEnumerationError> {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(EntryKind::Dir),
            Ok(_) => Ok(EntryKind::File),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(EntryKind::File),
            Err(err) => Err(err).context(EntryTypeSnafu {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn is_dir(self) -> bool {
        self == EntryKind::Dir
    }
}

/// Names of the direct children of one directory, symbolic links excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntrySet {
    names: HashSet<OsString>,
}

impl DirectoryEntrySet {
    pub fn read(dir: &Path) -> Result<Self, EntryEnumerationError> {
        let entries = fs::read_dir(dir).context(ListSnafu {
            path: dir.to_path_buf(),
        })?;

        let mut names = HashSet::new();
        for entry in entries {
            let entry = entry.context(ListSnafu {
                path: dir.to_path_buf(),
            })?;
            // DirEntry::file_type does not traverse the link
            let file_type = entry.file_type().context(EntryTypeSnafu {
                path: entry.path(),
            })?;
            if file_type.is_symlink() {
                debug!("Skipping symlink {}", entry.path().display());
                continue;
            }
            names.insert(entry.file_name());
        }

        debug!("Read {} entries from {}", names.len(), dir.display());
        Ok(Self { names })
    }

    pub fn contains(&self, name: &OsStr) -> bool {
        self.names.contains(name)
    }

    /// Every name present on either side, each exactly once, in byte order.
    pub fn union<'a>(&'a self, other: &'a Self) -> BTreeSet<&'a OsStr> {
        self.names
            .iter()
            .chain(other.names.iter())
            .map(OsString::as_os_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<OsString>> FromIterator<S> for DirectoryEntrySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum EntryEnumerationError {
    #[snafu(display("Failed to list directory {}", path.best_effort_path_display()))]
    ListError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to determine the type of {}", path.best_effort_path_display()))]
    EntryTypeError {
        path: PathBuf,
        source: std::io::Error,
    },
}
