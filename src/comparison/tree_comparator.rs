use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use snafu::{ErrorCompat, ResultExt, Snafu};
use tracing::{debug, warn};

use crate::comparison::{DiffNode, EntryCategory, TreeRenderer};
use crate::ext::BestEffortPathExt;
use crate::filesystem::{DirectoryEntrySet, EntryEnumerationError, EntryKind, files_identical};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompareOptions {
    /// Report subdirectories that cannot be listed instead of aborting.
    pub keep_going: bool,
}

/// A name from the union of both sides together with what it is on each side.
struct ClassifiedName<'a> {
    name: &'a OsStr,
    category: EntryCategory,
    kind_a: EntryKind,
    kind_b: EntryKind,
}

/// Walks two directory trees depth-first and collects their differences.
#[derive(Debug, Clone, Default)]
pub struct TreeComparator {
    options: CompareOptions,
}

impl TreeComparator {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    /// Compares the contents of two directories, recursing into every name
    /// that is a directory on both sides.
    ///
    /// Names are visited by category first and byte order second; the
    /// returned nodes keep that order.
    pub fn compare(&self, path_a: &Path, path_b: &Path) -> Result<Vec<DiffNode>, CompareError> {
        let set_a = DirectoryEntrySet::read(path_a).context(EnumerationSnafu {
            path_a: path_a.to_path_buf(),
            path_b: path_b.to_path_buf(),
        })?;
        let set_b = DirectoryEntrySet::read(path_b).context(EnumerationSnafu {
            path_a: path_a.to_path_buf(),
            path_b: path_b.to_path_buf(),
        })?;
        debug!(
            "Comparing {} ({} entries) with {} ({} entries)",
            path_a.display(),
            set_a.len(),
            path_b.display(),
            set_b.len()
        );
        if set_a.is_empty() && set_b.is_empty() {
            return Ok(Vec::new());
        }

        let mut ordered = set_a
            .union(&set_b)
            .into_iter()
            .map(|name| {
                let kind_a = EntryKind::of(&path_a.join(name))?;
                let kind_b = EntryKind::of(&path_b.join(name))?;
                Ok(ClassifiedName {
                    name,
                    category: EntryCategory::of(kind_a, kind_b),
                    kind_a,
                    kind_b,
                })
            })
            .collect::<Result<Vec<_>, EntryEnumerationError>>()
            .context(EnumerationSnafu {
                path_a: path_a.to_path_buf(),
                path_b: path_b.to_path_buf(),
            })?;
        ordered.sort_by(|left, right| {
            (left.category, left.name).cmp(&(right.category, right.name))
        });

        let mut nodes = Vec::new();
        for entry in ordered {
            let name = entry.name;
            let sub_path_a = path_a.join(name);
            let sub_path_b = path_b.join(name);

            let node = match (set_a.contains(name), set_b.contains(name)) {
                (true, true) => match (entry.kind_a, entry.kind_b) {
                    (EntryKind::Dir, EntryKind::Dir) => {
                        Some(self.descend(name, &sub_path_a, &sub_path_b)?)
                    }
                    (EntryKind::Dir, EntryKind::File) => Some(DiffNode::DirIsFile {
                        name: name.to_os_string(),
                        parent_a: path_a.to_path_buf(),
                        parent_b: path_b.to_path_buf(),
                    }),
                    (EntryKind::File, EntryKind::Dir) => Some(DiffNode::FileIsDir {
                        name: name.to_os_string(),
                        parent_a: path_a.to_path_buf(),
                        parent_b: path_b.to_path_buf(),
                    }),
                    (EntryKind::File, EntryKind::File) => {
                        if files_identical(&sub_path_a, &sub_path_b) {
                            None
                        } else {
                            Some(DiffNode::Differs {
                                name: name.to_os_string(),
                            })
                        }
                    }
                },
                (true, false) => Some(DiffNode::Missing {
                    name: name.to_os_string(),
                    kind: entry.kind_a,
                    missing_from: path_b.to_path_buf(),
                }),
                (false, _) => Some(DiffNode::Missing {
                    name: name.to_os_string(),
                    kind: entry.kind_b,
                    missing_from: path_a.to_path_buf(),
                }),
            };
            nodes.extend(node);
        }

        Ok(nodes)
    }

    /// Compares the two trees and renders the result into `sink` starting at
    /// `depth`. Nothing is written unless the whole comparison succeeds.
    ///
    /// Returns the number of differences found.
    pub fn compare_tree(
        &self,
        path_a: &Path,
        path_b: &Path,
        depth: usize,
        renderer: &TreeRenderer,
        sink: &mut impl Write,
    ) -> Result<usize, CompareError> {
        let nodes = self.compare(path_a, path_b)?;
        renderer
            .render_nodes(&nodes, depth, sink)
            .context(OutputSnafu)?;
        Ok(DiffNode::count_differences(&nodes))
    }

    fn descend(
        &self,
        name: &OsStr,
        sub_path_a: &Path,
        sub_path_b: &Path,
    ) -> Result<DiffNode, CompareError> {
        match self.compare(sub_path_a, sub_path_b) {
            Ok(children) => Ok(DiffNode::Directory {
                name: name.to_os_string(),
                children,
            }),
            Err(err) if self.options.keep_going => {
                let reason = err
                    .iter_chain()
                    .skip(1)
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(": ");
                warn!("Skipping {}: {reason}", sub_path_a.display());
                Ok(DiffNode::Unreadable {
                    name: name.to_os_string(),
                    reason,
                })
            }
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum CompareError {
    #[snafu(display(
        "Failed to compare {} with {}",
        path_a.best_effort_path_display(),
        path_b.best_effort_path_display()
    ))]
    EnumerationError {
        path_a: PathBuf,
        path_b: PathBuf,
        source: EntryEnumerationError,
    },
    #[snafu(display("Failed to write the comparison report"))]
    OutputError { source: std::io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;
    use tempfile::TempDir;

    /// Two empty sibling directories `a` and `b` inside one temp dir.
    struct TreePair {
        _root: TempDir,
        a: PathBuf,
        b: PathBuf,
    }

    impl TreePair {
        fn file(&self, side: &Path, relative: &str, content: &str) {
            let path = side.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent directories");
            }
            fs::write(path, content).expect("Failed to write file");
        }

        fn dir(&self, side: &Path, relative: &str) {
            fs::create_dir_all(side.join(relative)).expect("Failed to create directory");
        }

        fn report(&self, path_a: &Path, path_b: &Path) -> String {
            let renderer = TreeRenderer::new(false);
            let mut sink = Vec::new();
            renderer.write_root(&mut sink).expect("Failed to write root");
            TreeComparator::default()
                .compare_tree(path_a, path_b, 1, &renderer, &mut sink)
                .expect("Comparison failed");
            String::from_utf8(sink).expect("Report should be valid UTF-8")
        }
    }

    #[fixture]
    fn pair() -> TreePair {
        let root = TempDir::new().expect("Failed to create temp directory");
        let a = root.path().join("a");
        let b = root.path().join("b");
        fs::create_dir(&a).expect("Failed to create a");
        fs::create_dir(&b).expect("Failed to create b");
        TreePair { _root: root, a, b }
    }

    fn compare(pair: &TreePair) -> Vec<DiffNode> {
        TreeComparator::default()
            .compare(&pair.a, &pair.b)
            .expect("Comparison failed")
    }

    fn names(nodes: &[DiffNode]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| node.name().to_string_lossy().into_owned())
            .collect()
    }

    #[rstest]
    fn test_identical_trees_report_only_directories(pair: TreePair) {
        for side in [&pair.a, &pair.b] {
            pair.file(side, "top.txt", "top");
            pair.file(side, "empty.txt", "");
            pair.file(side, "docs/readme.md", "# readme");
            pair.file(side, "docs/nested/deep.bin", "deep");
            pair.dir(side, "empty_dir");
        }

        let nodes = compare(&pair);

        assert_eq!(DiffNode::count_differences(&nodes), 0);
        assert_eq!(
            pair.report(&pair.a, &pair.b),
            concat!(
                "|- <root>\n",
                "|  |- dir \"docs\"\n",
                "|  |  |- dir \"nested\"\n",
                "|  |- dir \"empty_dir\"\n",
            )
        );
    }

    #[rstest]
    fn test_ordering_by_category_then_name(pair: TreePair) {
        pair.file(&pair.a, "z.txt", "z");
        pair.file(&pair.b, "z.txt", "zz");
        pair.dir(&pair.a, "a");
        pair.dir(&pair.b, "a");
        pair.file(&pair.a, "m.txt", "only in a");
        pair.file(&pair.a, "b.txt", "b");
        pair.file(&pair.b, "b.txt", "B");
        pair.dir(&pair.a, "c");
        pair.file(&pair.b, "c", "file in b");

        let nodes = compare(&pair);

        assert_eq!(names(&nodes), vec!["b.txt", "m.txt", "z.txt", "c", "a"]);
    }

    #[rstest]
    fn test_dir_only_on_one_side_sorts_as_mixed(pair: TreePair) {
        pair.dir(&pair.a, "aaa_only_in_a");
        pair.dir(&pair.a, "shared");
        pair.dir(&pair.b, "shared");
        pair.file(&pair.b, "zzz.txt", "file");

        let nodes = compare(&pair);

        assert_eq!(names(&nodes), vec!["zzz.txt", "aaa_only_in_a", "shared"]);
    }

    #[rstest]
    fn test_type_mismatch_does_not_recurse(pair: TreePair) {
        pair.file(&pair.a, "x/inner.txt", "inner");
        pair.file(&pair.b, "x", "now a file");

        let nodes = compare(&pair);

        assert_eq!(
            nodes,
            vec![DiffNode::DirIsFile {
                name: "x".into(),
                parent_a: pair.a.clone(),
                parent_b: pair.b.clone(),
            }]
        );

        let swapped = TreeComparator::default()
            .compare(&pair.b, &pair.a)
            .expect("Comparison failed");
        assert_eq!(
            swapped,
            vec![DiffNode::FileIsDir {
                name: "x".into(),
                parent_a: pair.b.clone(),
                parent_b: pair.a.clone(),
            }]
        );
    }

    #[rstest]
    fn test_missing_entries(pair: TreePair) {
        pair.file(&pair.a, "only_a.txt", "a");
        pair.dir(&pair.b, "only_b");

        let nodes = compare(&pair);

        assert_eq!(
            nodes,
            vec![
                DiffNode::Missing {
                    name: "only_a.txt".into(),
                    kind: EntryKind::File,
                    missing_from: pair.b.clone(),
                },
                DiffNode::Missing {
                    name: "only_b".into(),
                    kind: EntryKind::Dir,
                    missing_from: pair.a.clone(),
                },
            ]
        );
    }

    #[rstest]
    fn test_differing_content_is_symmetric(pair: TreePair) {
        pair.file(&pair.a, "sub/f.txt", "version one");
        pair.file(&pair.b, "sub/f.txt", "version two");
        pair.file(&pair.a, "same.txt", "same");
        pair.file(&pair.b, "same.txt", "same");

        let forward = compare(&pair);
        let backward = TreeComparator::default()
            .compare(&pair.b, &pair.a)
            .expect("Comparison failed");

        let expected = vec![DiffNode::Directory {
            name: "sub".into(),
            children: vec![DiffNode::Differs {
                name: "f.txt".into(),
            }],
        }];
        assert_eq!(forward, expected);
        assert_eq!(backward, expected);
    }

    #[rstest]
    fn test_size_mismatch_with_shared_prefix_differs(pair: TreePair) {
        pair.file(&pair.a, "log.txt", "line one\n");
        pair.file(&pair.b, "log.txt", "line one\nline two\n");

        assert_eq!(
            compare(&pair),
            vec![DiffNode::Differs {
                name: "log.txt".into()
            }]
        );
    }

    #[rstest]
    fn test_empty_files_are_identical(pair: TreePair) {
        pair.file(&pair.a, "empty", "");
        pair.file(&pair.b, "empty", "");

        assert!(compare(&pair).is_empty());
    }

    #[rstest]
    fn test_nested_paths_in_messages(pair: TreePair) {
        pair.file(&pair.a, "one/two/gone.txt", "x");
        pair.dir(&pair.b, "one/two");

        let expected = format!(
            concat!(
                "|- <root>\n",
                "|  |- dir \"one\"\n",
                "|  |  |- dir \"two\"\n",
                "|  |  |  |- file \"gone.txt\" is missing in \"{}\"\n",
            ),
            pair.b.join("one").join("two").display()
        );
        assert_eq!(pair.report(&pair.a, &pair.b), expected);
    }

    #[cfg(unix)]
    #[rstest]
    fn test_symlinks_are_invisible(pair: TreePair) {
        use std::os::unix::fs::symlink;

        pair.file(&pair.a, "target.txt", "t");
        pair.file(&pair.b, "target.txt", "t");
        symlink(pair.a.join("target.txt"), pair.a.join("link")).expect("Failed to create symlink");
        symlink("/nowhere/at/all", pair.a.join("dangling")).expect("Failed to create symlink");

        assert!(compare(&pair).is_empty());
    }

    #[cfg(unix)]
    #[rstest]
    fn test_unlistable_directory(pair: TreePair) {
        use std::os::unix::fs::PermissionsExt;

        pair.file(&pair.a, "locked/secret.txt", "s");
        pair.dir(&pair.b, "locked");
        pair.file(&pair.a, "open/f.txt", "1");
        pair.file(&pair.b, "open/f.txt", "2");
        let locked = pair.a.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))
            .expect("Failed to change permissions");

        // Privileged users can list the directory regardless
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
                .expect("Failed to restore permissions");
            return;
        }

        let strict = TreeComparator::default().compare(&pair.a, &pair.b);
        let lenient = TreeComparator::new(CompareOptions { keep_going: true })
            .compare(&pair.a, &pair.b);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
            .expect("Failed to restore permissions");

        match strict {
            Err(CompareError::EnumerationError { path_a, .. }) => assert_eq!(path_a, locked),
            other => panic!("Expected EnumerationError, got {other:?}"),
        }

        let nodes = lenient.expect("Keep-going comparison should succeed");
        assert_eq!(names(&nodes), vec!["locked", "open"]);
        match &nodes[0] {
            DiffNode::Unreadable { reason, .. } => {
                assert!(reason.contains("Failed to list directory"))
            }
            other => panic!("Expected Unreadable, got {other:?}"),
        }
        assert_eq!(
            nodes[1],
            DiffNode::Directory {
                name: "open".into(),
                children: vec![DiffNode::Differs {
                    name: "f.txt".into()
                }],
            }
        );
    }

    #[cfg(unix)]
    #[rstest]
    fn test_failed_comparison_writes_nothing(pair: TreePair) {
        use std::os::unix::fs::PermissionsExt;

        pair.file(&pair.a, "aaa.txt", "reported before the failure");
        pair.dir(&pair.a, "locked");
        pair.dir(&pair.b, "locked");
        let locked = pair.a.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))
            .expect("Failed to change permissions");

        let listable = fs::read_dir(&locked).is_ok();
        let mut sink = Vec::new();
        let result = TreeComparator::default().compare_tree(
            &pair.a,
            &pair.b,
            1,
            &TreeRenderer::new(false),
            &mut sink,
        );

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
            .expect("Failed to restore permissions");
        if listable {
            return;
        }

        assert!(matches!(result, Err(CompareError::EnumerationError { .. })));
        assert!(sink.is_empty());
    }

    #[cfg(unix)]
    #[rstest]
    fn test_unsearchable_directory_is_fatal(pair: TreePair) {
        use std::os::unix::fs::PermissionsExt;

        pair.file(&pair.a, "sub/f.txt", "same");
        pair.file(&pair.b, "sub/f.txt", "same");
        let sub = pair.a.join("sub");
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o444))
            .expect("Failed to change permissions");

        // Privileged users can stat through the directory regardless
        let searchable = fs::metadata(sub.join("f.txt")).is_ok();
        let result = TreeComparator::default().compare(&pair.a, &pair.b);

        fs::set_permissions(&sub, fs::Permissions::from_mode(0o755))
            .expect("Failed to restore permissions");
        if searchable {
            return;
        }

        match result {
            Err(CompareError::EnumerationError { path_a, source, .. }) => {
                assert_eq!(path_a, sub);
                assert!(matches!(source, EntryEnumerationError::EntryTypeError { .. }));
            }
            other => panic!("Expected EnumerationError, got {other:?}"),
        }
    }
}
