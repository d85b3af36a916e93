//! Stateless façade over the sandbox components.
//!
//! Each operation is independent: no call observes another's state, and all
//! failures come back as a [`ToolError`] with a kind and a caller-safe message.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SandboxConfig;
use crate::constants::DEFAULT_HEAD_LINES;
use crate::error::{ErrorKind, SandboxError};
use crate::finder::FileFinder;
use crate::listing::{DirectoryLister, ListingResult};
use crate::reader::FileReader;
use crate::secret::SecretVerifier;

/// A named operation with its arguments.
///
/// Unknown argument keys are rejected rather than ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "operation",
    content = "arguments",
    rename_all = "snake_case",
    deny_unknown_fields
)]
pub enum ToolRequest {
    ListDirectory {
        dir_path: String,
    },
    ListDirectoryRecursive {
        dir_path: String,
    },
    FindFile {
        dir_path: String,
        filename: String,
    },
    GetFileContent {
        file_path: String,
    },
    GetFileHead {
        file_path: String,
        #[serde(default = "default_head_lines")]
        num_lines: i64,
    },
    VerifyFlag {
        proposed_flag: String,
    },
}

fn default_head_lines() -> i64 {
    DEFAULT_HEAD_LINES
}

impl ToolRequest {
    /// Operation name as exposed to callers.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ListDirectory { .. } => "list_directory",
            Self::ListDirectoryRecursive { .. } => "list_directory_recursive",
            Self::FindFile { .. } => "find_file",
            Self::GetFileContent { .. } => "get_file_content",
            Self::GetFileHead { .. } => "get_file_head",
            Self::VerifyFlag { .. } => "verify_flag",
        }
    }
}

/// Fixed-shape success payloads, one per operation family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    /// `list_directory`
    Names(Vec<String>),
    /// `list_directory_recursive`
    Listing(ListingResult),
    /// `find_file`
    Paths(Vec<String>),
    /// `get_file_content`, `get_file_head`
    Text(String),
    /// `verify_flag`
    Verdict { correct: bool },
}

/// Structured error returned across the request/response boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<SandboxError> for ToolError {
    fn from(err: SandboxError) -> Self {
        Self::new(err.kind(), err.caller_message())
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Exposes the sandbox operations by name.
#[derive(Debug, Clone)]
pub struct ToolService {
    config: Arc<SandboxConfig>,
    lister: DirectoryLister,
    finder: FileFinder,
    reader: FileReader,
    verifier: SecretVerifier,
}

impl ToolService {
    pub fn new(config: Arc<SandboxConfig>) -> Self {
        Self {
            lister: DirectoryLister::new(config.clone()),
            finder: FileFinder::new(config.clone()),
            reader: FileReader::new(config.clone()),
            verifier: SecretVerifier::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn list_directory(&self, dir_path: &str) -> Result<Vec<String>, ToolError> {
        Ok(self.lister.list_flat(dir_path)?)
    }

    pub fn list_directory_recursive(&self, dir_path: &str) -> Result<ListingResult, ToolError> {
        Ok(self.lister.list_recursive(dir_path)?)
    }

    pub fn find_file(&self, dir_path: &str, filename: &str) -> Result<Vec<String>, ToolError> {
        Ok(self.finder.find(dir_path, filename)?)
    }

    pub fn get_file_content(&self, file_path: &str) -> Result<String, ToolError> {
        Ok(self.reader.read_full(file_path)?.into_text())
    }

    pub fn get_file_head(&self, file_path: &str, num_lines: i64) -> Result<String, ToolError> {
        Ok(self.reader.read_head(file_path, num_lines)?.into_text())
    }

    pub fn verify_flag(&self, proposed_flag: &str) -> Result<bool, ToolError> {
        Ok(self.verifier.verify(proposed_flag)?)
    }

    /// Run a typed request.
    pub fn call(&self, request: ToolRequest) -> Result<ToolOutput, ToolError> {
        let operation = request.operation();
        let result = match request {
            ToolRequest::ListDirectory { dir_path } => {
                self.list_directory(&dir_path).map(ToolOutput::Names)
            }
            ToolRequest::ListDirectoryRecursive { dir_path } => self
                .list_directory_recursive(&dir_path)
                .map(ToolOutput::Listing),
            ToolRequest::FindFile { dir_path, filename } => {
                self.find_file(&dir_path, &filename).map(ToolOutput::Paths)
            }
            ToolRequest::GetFileContent { file_path } => {
                self.get_file_content(&file_path).map(ToolOutput::Text)
            }
            ToolRequest::GetFileHead {
                file_path,
                num_lines,
            } => self.get_file_head(&file_path, num_lines).map(ToolOutput::Text),
            ToolRequest::VerifyFlag { proposed_flag } => self
                .verify_flag(&proposed_flag)
                .map(|correct| ToolOutput::Verdict { correct }),
        };

        if let Err(e) = &result {
            tracing::info!(operation, kind = %e.kind, "operation failed");
        }
        result
    }

    /// Run an operation given by name with JSON arguments.
    ///
    /// Unknown operations and arguments of the wrong shape fail
    /// `InvalidArgument` before any component runs.
    pub fn dispatch(
        &self,
        operation: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let envelope = serde_json::json!({
            "operation": operation,
            "arguments": arguments,
        });
        let request: ToolRequest = serde_json::from_value(envelope)
            .map_err(|e| ToolError::new(ErrorKind::InvalidArgument, e.to_string()))?;
        self.call(request)
    }
}
