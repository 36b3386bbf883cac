//! Direct access to the two trees being compared.
//!
//! Everything here touches the disk: enumerating the non-symlink children of
//! a directory and checking two regular files for byte equality.

mod entry_set;
mod file_equality;

pub use entry_set::{DirectoryEntrySet, EntryEnumerationError, EntryKind};
pub use file_equality::files_identical;
