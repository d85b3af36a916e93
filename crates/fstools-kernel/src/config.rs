//! Sandbox configuration.
//!
//! [`SandboxSettings`] is the raw, optional-everything form read from a TOML
//! file and patched by command-line flags. [`SandboxConfig`] is the validated,
//! immutable value every component receives.
//!
//! ```toml
//! root = "/app/ai-filesystem-agent"
//! excluded = [".git", "node_modules"]
//! protected_name = "flag.txt"
//! max_file_size = 10485760
//! max_head_lines = 1000
//! timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    DEFAULT_EXCLUDED, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_HEAD_LINES, DEFAULT_PROTECTED_NAME,
    DEFAULT_ROOT, DEFAULT_TIMEOUT_SECS,
};
use crate::exclusion::ExclusionSet;

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`SandboxSettings`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Sandbox root is missing or not a directory.
    #[error("invalid sandbox root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },
}

/// Raw settings as they appear in a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxSettings {
    pub root: Option<String>,
    pub excluded: Option<Vec<String>>,
    pub protected_name: Option<String>,
    pub protected_path: Option<String>,
    pub max_file_size: Option<u64>,
    pub max_head_lines: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl SandboxSettings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a TOML file (`~` is expanded).
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let path: PathBuf = shellexpand::tilde(path).as_ref().into();
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: SandboxSettings) -> Self {
        Self {
            root: other.root.or(self.root),
            excluded: other.excluded.or(self.excluded),
            protected_name: other.protected_name.or(self.protected_name),
            protected_path: other.protected_path.or(self.protected_path),
            max_file_size: other.max_file_size.or(self.max_file_size),
            max_head_lines: other.max_head_lines.or(self.max_head_lines),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }
}

/// The one file whose content read operations never return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedResource {
    /// Reserved file name, matched against the resolved file's name.
    pub name: String,
    /// Fixed location the secret verifier reads from.
    pub location: PathBuf,
}

/// Immutable sandbox configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    root: PathBuf,
    excluded: ExclusionSet,
    protected: ProtectedResource,
    max_file_size: u64,
    max_head_lines: usize,
    timeout: Duration,
}

impl SandboxConfig {
    /// Create a config rooted at `root` with default limits.
    ///
    /// The root is canonicalized here, so later containment checks compare
    /// canonical against canonical (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let root = canonical_root(root.as_ref())?;
        let protected = ProtectedResource {
            name: DEFAULT_PROTECTED_NAME.to_string(),
            location: root.join(DEFAULT_PROTECTED_NAME),
        };
        Ok(Self {
            root,
            excluded: ExclusionSet::new(DEFAULT_EXCLUDED.iter().copied()),
            protected,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_head_lines: DEFAULT_MAX_HEAD_LINES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Build a config from settings, applying defaults for unset fields.
    pub fn from_settings(settings: SandboxSettings) -> Result<Self, ConfigError> {
        let root = settings.root.as_deref().unwrap_or(DEFAULT_ROOT);
        let root: PathBuf = shellexpand::tilde(root).as_ref().into();
        let mut config = Self::new(root)?;

        if let Some(excluded) = settings.excluded {
            config = config.with_excluded(excluded);
        }
        let name = settings
            .protected_name
            .unwrap_or_else(|| DEFAULT_PROTECTED_NAME.to_string());
        let location = match settings.protected_path {
            Some(path) => PathBuf::from(shellexpand::tilde(&path).as_ref()),
            None => config.root.join(&name),
        };
        config.protected = ProtectedResource { name, location };
        if let Some(max) = settings.max_file_size {
            config.max_file_size = max;
        }
        if let Some(max) = settings.max_head_lines {
            config.max_head_lines = max.max(1);
        }
        if let Some(secs) = settings.timeout_secs {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        Ok(config)
    }

    /// Replace the exclusion set.
    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = ExclusionSet::new(names);
        self
    }

    /// Replace the protected resource name; its location follows the root.
    pub fn with_protected_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.protected = ProtectedResource {
            location: self.root.join(&name),
            name,
        };
        self
    }

    /// Point the secret verifier at an explicit location.
    pub fn with_protected_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.protected.location = location.into();
        self
    }

    /// Set the size cap for full reads.
    pub fn with_max_file_size(mut self, max: u64) -> Self {
        self.max_file_size = max;
        self
    }

    /// Set the clamp for head reads.
    pub fn with_max_head_lines(mut self, max: usize) -> Self {
        self.max_head_lines = max.max(1);
        self
    }

    /// Set the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn excluded(&self) -> &ExclusionSet {
        &self.excluded
    }

    pub fn protected(&self) -> &ProtectedResource {
        &self.protected
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn max_head_lines(&self) -> usize {
        self.max_head_lines
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf, ConfigError> {
    let canonical = dunce::canonicalize(root).map_err(|e| ConfigError::InvalidRoot {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !canonical.is_dir() {
        return Err(ConfigError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SandboxConfig::new(dir.path()).unwrap();

        assert!(config.root().is_absolute());
        assert_eq!(config.max_file_size(), 10 * 1024 * 1024);
        assert_eq!(config.max_head_lines(), 1000);
        assert_eq!(config.protected().name, "flag.txt");
        assert_eq!(config.protected().location, config.root().join("flag.txt"));
        assert!(config.excluded().contains(".git"));
        assert!(config.excluded().contains("node_modules"));
    }

    #[test]
    fn test_root_is_canonicalized() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("inner")).unwrap();
        let config = SandboxConfig::new(dir.path().join("inner/../inner")).unwrap();

        assert_eq!(
            config.root(),
            dunce::canonicalize(dir.path().join("inner")).unwrap()
        );
    }

    #[test]
    fn test_missing_root_rejected() {
        let dir = TempDir::new().unwrap();
        let result = SandboxConfig::new(dir.path().join("nope"));
        assert!(matches!(result, Err(ConfigError::InvalidRoot { .. })));
    }

    #[test]
    fn test_file_root_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("file"), "x").unwrap();
        let result = SandboxConfig::new(dir.path().join("file"));
        assert!(matches!(result, Err(ConfigError::InvalidRoot { .. })));
    }

    #[test]
    fn test_settings_from_toml() {
        let dir = TempDir::new().unwrap();
        let text = format!(
            r#"
root = "{}"
excluded = ["target"]
protected_name = "secret.txt"
max_file_size = 64
max_head_lines = 5
"#,
            dir.path().display()
        );
        let settings = SandboxSettings::from_toml(&text).unwrap();
        let config = SandboxConfig::from_settings(settings).unwrap();

        assert!(config.excluded().contains("target"));
        assert!(!config.excluded().contains(".git"));
        assert_eq!(config.protected().name, "secret.txt");
        assert_eq!(config.protected().location, config.root().join("secret.txt"));
        assert_eq!(config.max_file_size(), 64);
        assert_eq!(config.max_head_lines(), 5);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = SandboxSettings::from_toml("rooot = \"/tmp\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let base = SandboxSettings {
            root: Some("/a".into()),
            max_file_size: Some(1),
            ..Default::default()
        };
        let overlay = SandboxSettings {
            root: Some("/b".into()),
            ..Default::default()
        };
        let merged = base.merge(overlay);
        assert_eq!(merged.root.as_deref(), Some("/b"));
        assert_eq!(merged.max_file_size, Some(1));
    }
}
