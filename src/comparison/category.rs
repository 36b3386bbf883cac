use crate::filesystem::EntryKind;

/// Sort bucket of a name, derived from whether each side is a directory.
///
/// Plain file differences are listed first, type conflicts next and
/// directory recursions last. A name that exists on one side only counts as
/// a non-directory on the side where it is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryCategory {
    BothFiles = 0,
    Mixed = 1,
    BothDirs = 2,
}

impl EntryCategory {
    pub fn of(kind_a: EntryKind, kind_b: EntryKind) -> Self {
        match (kind_a.is_dir(), kind_b.is_dir()) {
            (false, false) => EntryCategory::BothFiles,
            (true, true) => EntryCategory::BothDirs,
            _ => EntryCategory::Mixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(EntryKind::File, EntryKind::File, EntryCategory::BothFiles)]
    #[case(EntryKind::Dir, EntryKind::File, EntryCategory::Mixed)]
    #[case(EntryKind::File, EntryKind::Dir, EntryCategory::Mixed)]
    #[case(EntryKind::Dir, EntryKind::Dir, EntryCategory::BothDirs)]
    fn test_category_of(
        #[case] kind_a: EntryKind,
        #[case] kind_b: EntryKind,
        #[case] expected: EntryCategory,
    ) {
        assert_eq!(EntryCategory::of(kind_a, kind_b), expected);
    }

    #[test]
    fn test_categories_order_numerically() {
        assert!(EntryCategory::BothFiles < EntryCategory::Mixed);
        assert!(EntryCategory::Mixed < EntryCategory::BothDirs);
        assert_eq!(EntryCategory::BothDirs as u8, 2);
    }
}
