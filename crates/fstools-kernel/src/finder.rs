//! Recursive search for files by exact name.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SandboxConfig;
use crate::error::{SandboxError, SandboxResult};
use crate::exclusion::ExclusionFilter;
use crate::guard::PathGuard;
use crate::walk::{Entry, EntryKind, visible_entries};

/// Finds files by name below a directory in the sandbox.
#[derive(Debug, Clone)]
pub struct FileFinder {
    guard: PathGuard,
    filter: ExclusionFilter,
}

impl FileFinder {
    pub fn new(config: Arc<SandboxConfig>) -> Self {
        Self {
            filter: ExclusionFilter::new(config.excluded().clone()),
            guard: PathGuard::new(config),
        }
    }

    /// Absolute paths of every file named `filename`, in pre-order.
    ///
    /// No match is an empty result, not an error. Unreadable directories are
    /// skipped silently.
    #[tracing::instrument(skip(self), name = "fs.find")]
    pub fn find(&self, dir_path: &str, filename: &str) -> SandboxResult<Vec<String>> {
        self.find_with(dir_path, filename, |path| visible_entries(path, &self.filter))
    }

    fn find_with<F>(
        &self,
        dir_path: &str,
        filename: &str,
        read_entries: F,
    ) -> SandboxResult<Vec<String>>
    where
        F: Fn(&Path) -> io::Result<Vec<Entry>>,
    {
        if filename.is_empty() {
            return Err(SandboxError::invalid_argument("filename must not be empty"));
        }
        let root = self.guard.resolve(dir_path)?;
        root.require_dir()?;

        let mut matches = Vec::new();
        let mut visited: HashSet<PathBuf> = HashSet::from([root.as_path().to_path_buf()]);
        let mut stack = readable(read_entries(root.as_path()))?;
        stack.reverse();

        while let Some(entry) = stack.pop() {
            match entry.kind {
                EntryKind::File if entry.name == filename => {
                    if self.guard.canonical_within(&entry.path).is_some() {
                        matches.push(entry.path.to_string_lossy().into_owned());
                    }
                }
                EntryKind::Dir => {
                    let Some(canonical) = self.guard.canonical_within(&entry.path) else {
                        continue;
                    };
                    if !visited.insert(canonical) {
                        continue;
                    }
                    let mut children = readable(read_entries(&entry.path))?;
                    children.reverse();
                    stack.extend(children);
                }
                _ => {}
            }
        }

        tracing::debug!(count = matches.len(), "search complete");
        Ok(matches)
    }

}

/// Unreadable directories count as empty during a search.
fn readable(entries: io::Result<Vec<Entry>>) -> SandboxResult<Vec<Entry>> {
    match entries {
        Ok(entries) => Ok(entries),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            tracing::debug!("skipping unreadable directory during search");
            Ok(Vec::new())
        }
        Err(e) => Err(SandboxError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use std::os::unix::fs::{PermissionsExt, symlink};
    use tempfile::TempDir;

    fn setup() -> (FileFinder, TempDir) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/deep")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("config.toml")).unwrap();
        fs::write(root.join("config.toml/inner.txt"), "").unwrap();
        fs::write(root.join("a/deep/config.toml"), "deep").unwrap();
        fs::write(root.join("a/config.toml"), "a").unwrap();
        fs::write(root.join("b/config.toml"), "b").unwrap();
        fs::write(root.join(".git/config.toml"), "hidden").unwrap();
        let config = SandboxConfig::new(root).unwrap();
        (FileFinder::new(Arc::new(config)), dir)
    }

    fn rel(finder: &FileFinder, paths: &[String]) -> Vec<String> {
        paths
            .iter()
            .map(|p| {
                Path::new(p)
                    .strip_prefix(finder.guard.root())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_find_preorder_files_only() {
        let (finder, _dir) = setup();
        let found = finder.find("", "config.toml").unwrap();

        assert!(found.iter().all(|p| Path::new(p).is_absolute()));
        assert_eq!(
            rel(&finder, &found),
            vec!["a/config.toml", "a/deep/config.toml", "b/config.toml"]
        );
    }

    #[test]
    fn test_find_no_match_is_empty() {
        let (finder, _dir) = setup();
        assert!(finder.find("", "missing.txt").unwrap().is_empty());
    }

    #[test]
    fn test_find_errors() {
        let (finder, _dir) = setup();
        assert_eq!(finder.find("nope", "x").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            finder.find("a/config.toml", "x").unwrap_err().kind(),
            ErrorKind::NotADirectory
        );
        assert_eq!(finder.find("..", "x").unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(finder.find("", "").unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_find_cycle_terminates() {
        let (finder, dir) = setup();
        symlink(dir.path().join("a"), dir.path().join("a/deep/loop")).unwrap();

        let found = finder.find("", "config.toml").unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_find_skips_escaping_links() {
        let (finder, dir) = setup();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("config.toml"), "outside").unwrap();
        symlink(outside.path(), dir.path().join("b/out")).unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();
        symlink(
            outside.path().join("config.toml"),
            dir.path().join("c/config.toml"),
        )
        .unwrap();

        let found = finder.find("", "config.toml").unwrap();
        assert_eq!(
            rel(&finder, &found),
            vec!["a/config.toml", "a/deep/config.toml", "b/config.toml"]
        );
    }

    #[test]
    fn test_find_skips_unreadable_injected() {
        let (finder, _dir) = setup();
        let found = finder
            .find_with("", "config.toml", |path| {
                if path.ends_with("a/deep") {
                    Err(io::Error::from(io::ErrorKind::PermissionDenied))
                } else {
                    visible_entries(path, &finder.filter)
                }
            })
            .unwrap();

        assert_eq!(rel(&finder, &found), vec!["a/config.toml", "b/config.toml"]);
    }

    #[test]
    fn test_find_unreadable_start_is_empty() {
        let (finder, _dir) = setup();
        let found = finder
            .find_with("b", "config.toml", |_| {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            })
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_find_skips_unreadable() {
        let (finder, dir) = setup();
        let locked = dir.path().join("b");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let found = finder.find("", "config.toml");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(
            rel(&finder, &found.unwrap()),
            vec!["a/config.toml", "a/deep/config.toml"]
        );
    }
}
