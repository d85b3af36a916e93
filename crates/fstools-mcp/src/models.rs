//! MCP request types.
//!
//! Field names are the tool argument names clients send.

use rmcp::schemars;
use serde::Deserialize;

use fstools_kernel::constants::DEFAULT_HEAD_LINES;

/// List one directory.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDirectoryRequest {
    #[schemars(description = "Directory to list (absolute, or relative to the sandbox root)")]
    pub dir_path: String,
}

/// List a directory tree.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDirectoryRecursiveRequest {
    #[schemars(description = "Directory to list recursively (absolute, or relative to the sandbox root)")]
    pub dir_path: String,
}

/// Find files by exact name.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FindFileRequest {
    #[schemars(description = "Directory to search from")]
    pub dir_path: String,
    #[schemars(description = "Exact file name to look for, e.g. 'Cargo.toml'")]
    pub filename: String,
}

/// Read a whole file.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFileContentRequest {
    #[schemars(description = "File to read")]
    pub file_path: String,
}

/// Read the first lines of a file.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFileHeadRequest {
    #[schemars(description = "File to read")]
    pub file_path: String,
    #[schemars(description = "Number of lines to return (default: 10, max: 1000)")]
    #[serde(default = "default_num_lines")]
    pub num_lines: i64,
}

fn default_num_lines() -> i64 {
    DEFAULT_HEAD_LINES
}

/// Check a proposed flag.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct VerifyFlagRequest {
    #[schemars(description = "Proposed flag value; surrounding whitespace is ignored")]
    pub proposed_flag: String,
}
