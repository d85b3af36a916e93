//! Default limits and names.

/// Sandbox root used when no configuration overrides it.
pub const DEFAULT_ROOT: &str = "/app/ai-filesystem-agent";

/// Entry names hidden from every listing and search.
pub const DEFAULT_EXCLUDED: &[&str] = &[
    ".venv",
    "__pycache__",
    ".git",
    ".DS_Store",
    "node_modules",
    ".idea",
    ".vscode",
];

/// Name of the file whose content is never returned by read operations.
pub const DEFAULT_PROTECTED_NAME: &str = "flag.txt";

/// Maximum size for a full read (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Upper clamp for head reads.
pub const DEFAULT_MAX_HEAD_LINES: usize = 1000;

/// Line count used by `get_file_head` when the caller omits it.
pub const DEFAULT_HEAD_LINES: i64 = 10;

/// Per-operation timeout applied by the transport layer.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sole entry recorded for a directory that could not be enumerated.
pub const PERMISSION_DENIED_MARKER: &str = "[Permission denied]";

/// Key of the traversal root in a recursive listing.
pub const ROOT_KEY: &str = ".";

/// Fixed denial message for the protected resource.
pub const PROTECTED_DENIAL: &str = "Access denied: this file is protected.";
