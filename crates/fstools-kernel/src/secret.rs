//! Verification of a proposed value against the protected resource.

use std::fs::File;
use std::io::{self, Read};
use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::config::SandboxConfig;
use crate::error::{SandboxError, SandboxResult};

/// Compares caller input to the protected file's content without revealing it.
///
/// The reference is always read from the configured location, never from a
/// caller-supplied path, and bypasses the reader's protected-file guard.
#[derive(Debug, Clone)]
pub struct SecretVerifier {
    config: Arc<SandboxConfig>,
}

impl SecretVerifier {
    pub fn new(config: Arc<SandboxConfig>) -> Self {
        Self { config }
    }

    /// True when `proposed` equals the reference, both trimmed.
    #[tracing::instrument(skip_all, name = "fs.verify")]
    pub fn verify(&self, proposed: &str) -> SandboxResult<bool> {
        let bytes = self.read_reference()?;
        let reference = String::from_utf8_lossy(&bytes);

        let correct: bool = proposed
            .trim()
            .as_bytes()
            .ct_eq(reference.trim().as_bytes())
            .into();
        tracing::info!(correct, "verification attempt");
        Ok(correct)
    }

    /// The reference bytes, bounded by the configured size cap.
    fn read_reference(&self) -> SandboxResult<Vec<u8>> {
        let location = &self.config.protected().location;
        let handle = match File::open(location) {
            Ok(handle) => handle,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::error!(path = %location.display(), "protected resource missing");
                return Err(SandboxError::not_found("protected resource"));
            }
            Err(e) => return Err(SandboxError::Io(e)),
        };

        let max = self.config.max_file_size();
        let len = handle.metadata()?.len();
        let mut bytes = Vec::new();
        if len <= max {
            handle.take(max.saturating_add(1)).read_to_end(&mut bytes)?;
        }
        if len > max || bytes.len() as u64 > max {
            tracing::error!(max, "protected resource exceeds size cap");
            return Err(SandboxError::TooLarge {
                size: len.max(bytes.len() as u64),
                max,
            });
        }
        Ok(bytes)
    }
}
