use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::filesystem::EntryKind;

/// One reported entry of the comparison.
///
/// Parent paths are the directories being compared at that level, exactly as
/// they were joined together from the root arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffNode {
    /// Regular file on both sides with different contents.
    Differs { name: OsString },
    /// Directory under `parent_a`, file under `parent_b`.
    DirIsFile {
        name: OsString,
        parent_a: PathBuf,
        parent_b: PathBuf,
    },
    /// File under `parent_a`, directory under `parent_b`.
    FileIsDir {
        name: OsString,
        parent_a: PathBuf,
        parent_b: PathBuf,
    },
    /// Present on one side only; `kind` is its type on the side that has it.
    Missing {
        name: OsString,
        kind: EntryKind,
        missing_from: PathBuf,
    },
    /// Directory on both sides, compared recursively.
    Directory {
        name: OsString,
        children: Vec<DiffNode>,
    },
    /// Directory on both sides whose contents could not be listed.
    Unreadable { name: OsString, reason: String },
}

impl DiffNode {
    pub fn name(&self) -> &OsString {
        match self {
            DiffNode::Differs { name }
            | DiffNode::DirIsFile { name, .. }
            | DiffNode::FileIsDir { name, .. }
            | DiffNode::Missing { name, .. }
            | DiffNode::Directory { name, .. }
            | DiffNode::Unreadable { name, .. } => name,
        }
    }

    /// Writes the report line for this node. Names and paths are written as
    /// their raw bytes on unix so that non-UTF-8 names can still be located.
    pub fn write_raw(&self, sink: &mut impl Write) -> io::Result<()> {
        let name = raw_bytes(self.name());
        let segments = match self {
            DiffNode::Differs { .. } => vec![text("file \""), name, text("\" differs")],
            DiffNode::DirIsFile {
                parent_a, parent_b, ..
            } => vec![
                text("dir \""),
                name,
                text("\" in \""),
                raw_bytes(parent_a.as_os_str()),
                text("\" is a file in \""),
                raw_bytes(parent_b.as_os_str()),
                text("\""),
            ],
            DiffNode::FileIsDir {
                parent_a, parent_b, ..
            } => vec![
                text("file \""),
                name,
                text("\" in \""),
                raw_bytes(parent_a.as_os_str()),
                text("\" is a dir in \""),
                raw_bytes(parent_b.as_os_str()),
                text("\""),
            ],
            DiffNode::Missing {
                kind, missing_from, ..
            } => vec![
                Cow::Owned(kind.to_string().into_bytes()),
                text(" \""),
                name,
                text("\" is missing in \""),
                raw_bytes(missing_from.as_os_str()),
                text("\""),
            ],
            DiffNode::Directory { .. } => vec![text("dir \""), name, text("\"")],
            DiffNode::Unreadable { reason, .. } => vec![
                text("dir \""),
                name,
                text("\" could not be compared: "),
                text(reason),
            ],
        };
        segments
            .iter()
            .try_for_each(|segment| sink.write_all(segment))
    }

    /// Number of reported differences in `nodes`, recursing into directories.
    /// Directory headers themselves are not differences.
    pub fn count_differences(nodes: &[DiffNode]) -> usize {
        nodes
            .iter()
            .map(|node| match node {
                DiffNode::Directory { children, .. } => Self::count_differences(children),
                _ => 1,
            })
            .sum()
    }
}

impl fmt::Display for DiffNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = Vec::new();
        self.write_raw(&mut line).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&line))
    }
}

#[cfg(unix)]
fn raw_bytes(value: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;

    Cow::Borrowed(value.as_bytes())
}

#[cfg(not(unix))]
fn raw_bytes(value: &OsStr) -> Cow<'_, [u8]> {
    match value.to_string_lossy() {
        Cow::Borrowed(lossy) => Cow::Borrowed(lossy.as_bytes()),
        Cow::Owned(lossy) => Cow::Owned(lossy.into_bytes()),
    }
}

fn text(value: &str) -> Cow<'_, [u8]> {
    Cow::Borrowed(value.as_bytes())
}
