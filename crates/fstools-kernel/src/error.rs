//! Sandbox error types.

use std::io;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::constants::PROTECTED_DENIAL;

/// Sandbox error type.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Path is outside the sandbox or cannot be resolved.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Path or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a regular file.
    #[error("not a file: {0}")]
    NotAFile(String),

    /// Protected resource, or the OS refused access.
    #[error("{0}")]
    AccessDenied(String),

    /// File exceeds the configured size cap.
    #[error("file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// Malformed argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SandboxError {
    /// Create an InvalidPath error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: impl Into<String>) -> Self {
        Self::NotAFile(path.into())
    }

    /// The fixed denial for the protected resource.
    pub fn protected() -> Self {
        Self::AccessDenied(PROTECTED_DENIAL.to_string())
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Translate an I/O error on a caller-targeted path into the taxonomy.
    ///
    /// `shown` is the caller-supplied path string; resolved paths never
    /// appear in messages.
    pub fn from_io(err: io::Error, shown: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::not_found(shown),
            io::ErrorKind::PermissionDenied => {
                Self::AccessDenied(format!("permission denied: {}", shown))
            }
            io::ErrorKind::NotADirectory => Self::not_a_directory(shown),
            io::ErrorKind::IsADirectory => Self::not_a_file(shown),
            _ => Self::Io(err),
        }
    }

    /// Wire kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath(_) => ErrorKind::InvalidPath,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::NotAFile(_) => ErrorKind::NotAFile,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Message safe to hand back across the trust boundary.
    pub fn caller_message(&self) -> String {
        match self {
            Self::InvalidPath(msg) => format!("Invalid path: {}", msg),
            Self::NotFound(path) => format!("Not found: {}", path),
            Self::NotADirectory(path) => format!("Not a directory: {}", path),
            Self::NotAFile(path) => format!("Not a file: {}", path),
            Self::AccessDenied(msg) => msg.clone(),
            Self::TooLarge { size, max } => {
                format!("File too large: {} bytes (max {})", size, max)
            }
            Self::InvalidArgument(msg) => format!("Invalid argument: {}", msg),
            Self::Io(e) => format!("I/O error: {}", e.kind()),
        }
    }
}

/// Closed set of error kinds reported to callers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
pub enum ErrorKind {
    InvalidPath,
    NotFound,
    NotADirectory,
    NotAFile,
    AccessDenied,
    TooLarge,
    InvalidArgument,
    /// Failure no other kind describes.
    Io,
    /// The operation exceeded its time budget.
    Timeout,
}

/// Sandbox result type.
pub type SandboxResult<T> = Result<T, SandboxError>;
