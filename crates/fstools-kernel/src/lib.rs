//! Sandboxed filesystem access layer for fstools.
//!
//! Every operation here is read-only and scoped to a single sandbox root.
//! Key components:
//!
//! - [`PathGuard`] - Resolves caller paths and enforces root containment
//! - [`ExclusionFilter`] - Hides configured entry names from listings and searches
//! - [`DirectoryLister`] - Flat and recursive directory listings
//! - [`FileFinder`] - Recursive search for a file by exact name
//! - [`FileReader`] - Full and head-limited reads with a protected-file guard
//! - [`SecretVerifier`] - Checks a proposed value against the protected file
//! - [`ToolService`] - Stateless façade dispatching named operations
//!
//! ## Design Decisions
//!
//! - **Injected config**: an immutable [`SandboxConfig`] is built once and shared
//!   as `Arc<SandboxConfig>`; nothing reads ambient global state.
//! - **Fresh checks**: containment is re-verified on every call, never cached.
//! - **Component-wise containment**: canonical paths are compared by component,
//!   so `/app/project-evil` is not inside `/app/project`.

pub mod config;
pub mod constants;
mod error;
mod exclusion;
mod finder;
mod guard;
mod listing;
mod reader;
mod secret;
pub mod service;
mod walk;

pub use config::{ConfigError, ProtectedResource, SandboxConfig, SandboxSettings};
pub use error::{ErrorKind, SandboxError, SandboxResult};
pub use exclusion::{ExclusionFilter, ExclusionSet};
pub use finder::FileFinder;
pub use guard::{PathGuard, ResolvedPath};
pub use listing::{DirectoryLister, ListingResult};
pub use reader::{FileContent, FileReader};
pub use secret::SecretVerifier;
pub use service::{ToolError, ToolOutput, ToolRequest, ToolService};
