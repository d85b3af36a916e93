//! Path resolution and sandbox containment.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SandboxConfig;
use crate::error::{SandboxError, SandboxResult};

/// A caller path that has been canonicalized and found inside the sandbox.
///
/// The final component may not exist; callers check with [`Self::require_dir`]
/// or [`Self::require_file`]. Never cached across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    shown: String,
}

impl ResolvedPath {
    /// Canonical absolute path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// The path as the caller wrote it, for messages.
    pub fn shown(&self) -> &str {
        &self.shown
    }

    /// Name of the final component of the canonical path.
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Metadata (following symlinks), with errors mapped to the taxonomy.
    pub fn metadata(&self) -> SandboxResult<Metadata> {
        std::fs::metadata(&self.path).map_err(|e| SandboxError::from_io(e, &self.shown))
    }

    pub fn require_dir(&self) -> SandboxResult<Metadata> {
        let meta = self.metadata()?;
        if !meta.is_dir() {
            return Err(SandboxError::not_a_directory(&self.shown));
        }
        Ok(meta)
    }

    pub fn require_file(&self) -> SandboxResult<Metadata> {
        let meta = self.metadata()?;
        if !meta.is_file() {
            return Err(SandboxError::not_a_file(&self.shown));
        }
        Ok(meta)
    }
}

/// Resolves caller-supplied paths against the sandbox root.
#[derive(Debug, Clone)]
pub struct PathGuard {
    config: Arc<SandboxConfig>,
}

impl PathGuard {
    pub fn new(config: Arc<SandboxConfig>) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        self.config.root()
    }

    /// Resolve `candidate` to a canonical in-sandbox path.
    ///
    /// `~` is expanded and relative paths are taken from the sandbox root.
    /// `..` in the input is fine as long as the canonical result stays inside.
    pub fn resolve(&self, candidate: &str) -> SandboxResult<ResolvedPath> {
        let expanded = shellexpand::tilde(candidate);
        let path = Path::new(expanded.as_ref());
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        };

        let canonical = match dunce::canonicalize(&full) {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == io::ErrorKind::NotFound && is_absent(&full) => {
                // Leaf does not exist: canonicalize the parent and reattach the
                // name so the caller gets NotFound rather than InvalidPath.
                let (Some(parent), Some(name)) = (full.parent(), full.file_name()) else {
                    return Err(unresolvable(candidate, &e));
                };
                dunce::canonicalize(parent)
                    .map_err(|e| unresolvable(candidate, &e))?
                    .join(name)
            }
            Err(e) => return Err(unresolvable(candidate, &e)),
        };

        if !self.contains(&canonical) {
            tracing::warn!(candidate, "path outside sandbox rejected");
            return Err(SandboxError::invalid_path(format!(
                "{} is outside the sandbox",
                candidate
            )));
        }

        Ok(ResolvedPath {
            path: canonical,
            shown: candidate.to_string(),
        })
    }

    /// Whether a canonical path is the root or below it.
    ///
    /// `Path::starts_with` compares whole components, so a sibling that merely
    /// shares a textual prefix with the root is not contained.
    pub fn contains(&self, canonical: &Path) -> bool {
        canonical.starts_with(self.root())
    }

    /// Canonicalize a path met during traversal, keeping it only if it stays
    /// inside the sandbox.
    pub fn canonical_within(&self, path: &Path) -> Option<PathBuf> {
        let canonical = dunce::canonicalize(path).ok()?;
        if self.contains(&canonical) {
            Some(canonical)
        } else {
            tracing::debug!(path = %path.display(), "traversal target leaves sandbox");
            None
        }
    }
}

fn is_absent(path: &Path) -> bool {
    matches!(
        std::fs::symlink_metadata(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound
    )
}

fn unresolvable(candidate: &str, err: &io::Error) -> SandboxError {
    SandboxError::invalid_path(format!("{}: {}", candidate, err.kind()))
}
