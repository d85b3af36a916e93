//! MCP server exposing sandboxed filesystem tools.
//!
//! Six independent, read-only tools backed by [`fstools_kernel::ToolService`]:
//! `list_directory`, `list_directory_recursive`, `find_file`,
//! `get_file_content`, `get_file_head` and `verify_flag`.
//!
//! ## Module Structure
//!
//! - `models`: Request types for MCP tools
//! - `helpers`: Result conversion

mod helpers;
mod models;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde_json::{Value, json};

use fstools_kernel::{ErrorKind, SandboxConfig, ToolError, ToolService};

pub use models::*;
use helpers::*;

// ============================================================================
// FsToolsMcp Server
// ============================================================================

/// MCP server exposing the sandbox operations.
///
/// Cheap to clone; every clone shares the same immutable config.
#[derive(Clone)]
pub struct FsToolsMcp {
    service: ToolService,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for FsToolsMcp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsToolsMcp")
            .field("root", &self.service.config().root())
            .field("tool_router", &self.tool_router)
            .finish()
    }
}

impl FsToolsMcp {
    pub fn new(config: Arc<SandboxConfig>) -> Self {
        Self {
            service: ToolService::new(config),
            tool_router: Self::tool_router(),
        }
    }

    pub fn service(&self) -> &ToolService {
        &self.service
    }

    /// Run a blocking service call off the async runtime, bounded by the
    /// configured timeout.
    ///
    /// A timed-out call keeps running on its blocking thread until the
    /// filesystem returns; only the response is abandoned.
    async fn run<F>(&self, operation: &'static str, call: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(ToolService) -> Result<Value, ToolError> + Send + 'static,
    {
        let service = self.service.clone();
        let timeout = service.config().timeout();
        let task = tokio::task::spawn_blocking(move || call(service));

        let outcome = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::error!(operation, "tool task failed: {}", e);
                return Err(McpError::internal_error(
                    format!("{} failed unexpectedly", operation),
                    None,
                ));
            }
            Err(_) => {
                tracing::warn!(operation, ?timeout, "tool call timed out");
                Err(ToolError::new(
                    ErrorKind::Timeout,
                    format!("{} did not finish within {:?}", operation, timeout),
                ))
            }
        };

        Ok(into_call_result(outcome))
    }
}

#[tool_router]
impl FsToolsMcp {
    // ========================================================================
    // Listing Tools
    // ========================================================================

    #[tool(description = "List the contents of a directory. Returns entry names sorted lexicographically.")]
    async fn list_directory(
        &self,
        Parameters(req): Parameters<ListDirectoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run("list_directory", move |service| {
            service.list_directory(&req.dir_path).map(result_payload)
        })
        .await
    }

    #[tool(description = "Recursively list all directories and files. Returns a map from directory path (relative, '.' for the start directory) to its sorted entry names.")]
    async fn list_directory_recursive(
        &self,
        Parameters(req): Parameters<ListDirectoryRecursiveRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run("list_directory_recursive", move |service| {
            service
                .list_directory_recursive(&req.dir_path)
                .map(result_payload)
        })
        .await
    }

    #[tool(description = "Search for a file by exact name in a directory and its subdirectories. Returns absolute paths; empty when nothing matches.")]
    async fn find_file(
        &self,
        Parameters(req): Parameters<FindFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run("find_file", move |service| {
            service
                .find_file(&req.dir_path, &req.filename)
                .map(result_payload)
        })
        .await
    }

    // ========================================================================
    // Reading Tools
    // ========================================================================

    #[tool(description = "Read the complete content of a file (max 10 MiB by default). Invalid UTF-8 is replaced.")]
    async fn get_file_content(
        &self,
        Parameters(req): Parameters<GetFileContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run("get_file_content", move |service| {
            service.get_file_content(&req.file_path).map(result_payload)
        })
        .await
    }

    #[tool(description = "Read the first N lines of a file (default 10, capped at 1000).")]
    async fn get_file_head(
        &self,
        Parameters(req): Parameters<GetFileHeadRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run("get_file_head", move |service| {
            service
                .get_file_head(&req.file_path, req.num_lines)
                .map(result_payload)
        })
        .await
    }

    #[tool(description = "Verify whether a proposed flag is correct. Returns {\"correct\": bool}.")]
    async fn verify_flag(
        &self,
        Parameters(req): Parameters<VerifyFlagRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run("verify_flag", move |service| {
            service
                .verify_flag(&req.proposed_flag)
                .map(|correct| json!({ "correct": correct }))
        })
        .await
    }
}

#[tool_handler]
impl ServerHandler for FsToolsMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build()).with_instructions(
            format!(
                "Read-only filesystem tools sandboxed to {}. Paths outside it are rejected. \
                 The protected file '{}' can be listed but never read; use verify_flag to check a guess.",
                self.service.config().root().display(),
                self.service.config().protected().name,
            ),
        )
    }
}
