//! Flat and recursive directory listings.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::SandboxConfig;
use crate::constants::{PERMISSION_DENIED_MARKER, ROOT_KEY};
use crate::error::{SandboxError, SandboxResult};
use crate::exclusion::ExclusionFilter;
use crate::guard::{PathGuard, ResolvedPath};
use crate::walk::{Entry, EntryKind, visible_entries};

/// Relative directory path → sorted visible entry names, in traversal order.
///
/// The traversal root is keyed by `"."`. Directories with no visible
/// entries are absent.
pub type ListingResult = IndexMap<String, Vec<String>>;

/// Lists directories inside the sandbox.
#[derive(Debug, Clone)]
pub struct DirectoryLister {
    guard: PathGuard,
    filter: ExclusionFilter,
}

impl DirectoryLister {
    pub fn new(config: Arc<SandboxConfig>) -> Self {
        Self {
            filter: ExclusionFilter::new(config.excluded().clone()),
            guard: PathGuard::new(config),
        }
    }

    /// Visible entry names of one directory, sorted.
    #[tracing::instrument(skip(self), name = "fs.list")]
    pub fn list_flat(&self, dir_path: &str) -> SandboxResult<Vec<String>> {
        let dir = self.open_dir(dir_path)?;
        let entries = visible_entries(dir.as_path(), &self.filter)
            .map_err(|e| SandboxError::from_io(e, dir.shown()))?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    /// Depth-first listing of every visible directory below `dir_path`.
    ///
    /// Unreadable directories get a single marker entry instead of failing
    /// the traversal. Each canonical directory is entered at most once, so
    /// symlink cycles terminate.
    #[tracing::instrument(skip(self), name = "fs.list_recursive")]
    pub fn list_recursive(&self, dir_path: &str) -> SandboxResult<ListingResult> {
        self.list_recursive_with(dir_path, |path| visible_entries(path, &self.filter))
    }

    fn list_recursive_with<F>(
        &self,
        dir_path: &str,
        read_entries: F,
    ) -> SandboxResult<ListingResult>
    where
        F: Fn(&Path) -> io::Result<Vec<Entry>>,
    {
        let dir = self.open_dir(dir_path)?;

        let mut result = ListingResult::new();
        let mut visited: HashSet<PathBuf> = HashSet::from([dir.as_path().to_path_buf()]);
        let mut stack = vec![(dir.as_path().to_path_buf(), ROOT_KEY.to_string())];

        while let Some((path, key)) = stack.pop() {
            let entries = match read_entries(&path) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    tracing::debug!(key = %key, "permission denied during listing");
                    result.insert(key, vec![PERMISSION_DENIED_MARKER.to_string()]);
                    continue;
                }
                Err(e) => return Err(SandboxError::Io(e)),
            };
            if entries.is_empty() {
                continue;
            }

            let mut subdirs = Vec::new();
            for entry in &entries {
                if entry.kind != EntryKind::Dir {
                    continue;
                }
                let Some(canonical) = self.guard.canonical_within(&entry.path) else {
                    continue;
                };
                if visited.insert(canonical) {
                    subdirs.push((entry.path.clone(), child_key(&key, &entry.name)));
                } else {
                    tracing::debug!(key = %key, name = %entry.name, "directory already visited");
                }
            }

            result.insert(key, entries.into_iter().map(|e| e.name).collect());
            stack.extend(subdirs.into_iter().rev());
        }

        Ok(result)
    }

    fn open_dir(&self, dir_path: &str) -> SandboxResult<ResolvedPath> {
        let dir = self.guard.resolve(dir_path)?;
        dir.require_dir()?;
        Ok(dir)
    }
}

fn child_key(parent: &str, name: &str) -> String {
    if parent == ROOT_KEY {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
