//! Directory entry reading shared by the lister and the finder.

use std::io;
use std::path::{Path, PathBuf};

use crate::exclusion::ExclusionFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Dir,
    File,
    Other,
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Read the visible entries of `dir`, sorted by name.
///
/// Kinds follow symlinks, so a link to a directory is a `Dir` and a dangling
/// link is `Other`.
pub(crate) fn visible_entries(dir: &Path, filter: &ExclusionFilter) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !filter.is_visible(&name) {
            continue;
        }

        let path = entry.path();
        let kind = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => EntryKind::Dir,
            Ok(meta) if meta.is_file() => EntryKind::File,
            _ => EntryKind::Other,
        };
        entries.push(Entry { name, path, kind });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ExclusionSet;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn test_sorted_filtered_and_typed() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("b_dir")).unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        symlink(dir.path().join("b_dir"), dir.path().join("c_link")).unwrap();
        symlink(dir.path().join("missing"), dir.path().join("d_dangling")).unwrap();

        let filter = ExclusionFilter::new(ExclusionSet::new([".git"]));
        let entries = visible_entries(dir.path(), &filter).unwrap();

        let summary: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("a.txt", EntryKind::File),
                ("b_dir", EntryKind::Dir),
                ("c_link", EntryKind::Dir),
                ("d_dangling", EntryKind::Other),
            ]
        );
    }
}
