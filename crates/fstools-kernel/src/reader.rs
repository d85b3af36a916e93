//! File reads with a protected-file guard and size limits.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;

use serde::Serialize;

use crate::config::SandboxConfig;
use crate::error::{SandboxError, SandboxResult};
use crate::guard::{PathGuard, ResolvedPath};

/// Decoded file text. Invalid UTF-8 is replaced, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FileContent {
    /// Entire file.
    Full(String),
    /// First lines, newline-joined without a trailing newline.
    Head(String),
}

impl FileContent {
    pub fn text(&self) -> &str {
        match self {
            Self::Full(text) | Self::Head(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Full(text) | Self::Head(text) => text,
        }
    }
}

/// Reads file content inside the sandbox.
#[derive(Debug, Clone)]
pub struct FileReader {
    guard: PathGuard,
    config: Arc<SandboxConfig>,
}

impl FileReader {
    pub fn new(config: Arc<SandboxConfig>) -> Self {
        Self {
            guard: PathGuard::new(config.clone()),
            config,
        }
    }

    /// Read a whole file, up to the configured size cap.
    #[tracing::instrument(skip(self), name = "fs.read")]
    pub fn read_full(&self, file_path: &str) -> SandboxResult<FileContent> {
        let file = self.guard.resolve(file_path)?;
        self.check_protected(&file)?;

        let max = self.config.max_file_size();
        let meta = file.require_file()?;
        if meta.len() > max {
            return Err(SandboxError::TooLarge {
                size: meta.len(),
                max,
            });
        }

        // The file may grow after the size check; never read past the cap.
        let handle = self.open(&file)?;
        let mut bytes = Vec::with_capacity(meta.len() as usize);
        handle.take(max.saturating_add(1)).read_to_end(&mut bytes)?;
        if bytes.len() as u64 > max {
            return Err(SandboxError::TooLarge {
                size: bytes.len() as u64,
                max,
            });
        }

        Ok(FileContent::Full(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Read the first `line_count` lines, clamped to the configured maximum.
    ///
    /// Lines are read within the size cap. A requested line that does not end
    /// within it fails `TooLarge` instead of coming back cut short.
    #[tracing::instrument(skip(self), name = "fs.read_head")]
    pub fn read_head(&self, file_path: &str, line_count: i64) -> SandboxResult<FileContent> {
        let file = self.guard.resolve(file_path)?;
        self.check_protected(&file)?;

        if line_count < 1 {
            return Err(SandboxError::invalid_argument(format!(
                "num_lines must be >= 1, got: {}",
                line_count
            )));
        }
        let limit = usize::try_from(line_count)
            .unwrap_or(usize::MAX)
            .min(self.config.max_head_lines());

        let max = self.config.max_file_size();
        let meta = file.require_file()?;
        let handle = self.open(&file)?;
        let mut reader = BufReader::new(handle.take(max.saturating_add(1)));

        let mut lines = Vec::with_capacity(limit);
        let mut buf = Vec::new();
        let mut consumed: u64 = 0;
        while lines.len() < limit {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            consumed += n as u64;
            if consumed > max {
                return Err(SandboxError::TooLarge {
                    size: meta.len().max(consumed),
                    max,
                });
            }
            while matches!(buf.last(), Some(b'\n' | b'\r')) {
                buf.pop();
            }
            lines.push(String::from_utf8_lossy(&buf).into_owned());
        }

        Ok(FileContent::Head(lines.join("\n")))
    }

    /// Must run before any existence or size check on the file.
    fn check_protected(&self, file: &ResolvedPath) -> SandboxResult<()> {
        if file.file_name().as_deref() == Some(self.config.protected().name.as_str()) {
            tracing::warn!(path = file.shown(), "read of protected resource denied");
            return Err(SandboxError::protected());
        }
        Ok(())
    }

    fn open(&self, file: &ResolvedPath) -> SandboxResult<File> {
        File::open(file.as_path()).map_err(|e| SandboxError::from_io(e, file.shown()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PROTECTED_DENIAL;
    use crate::error::ErrorKind;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn setup() -> (FileReader, TempDir) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("docs")).unwrap();
        fs::write(root.join("flag.txt"), "FLAG{secret}\n").unwrap();
        fs::write(root.join("docs/notes.txt"), "hello\nworld\n").unwrap();
        let ten: String = (1..=10).map(|i| format!("line {}\n", i)).collect();
        fs::write(root.join("ten.txt"), ten).unwrap();
        let config = SandboxConfig::new(root).unwrap().with_max_file_size(64);
        (FileReader::new(Arc::new(config)), dir)
    }

    #[test]
    fn test_read_full() {
        let (reader, _dir) = setup();
        let content = reader.read_full("docs/notes.txt").unwrap();
        assert_eq!(content, FileContent::Full("hello\nworld\n".to_string()));
    }

    #[test]
    fn test_read_full_invalid_utf8_replaced() {
        let (reader, dir) = setup();
        fs::write(dir.path().join("bin.dat"), [b'o', b'k', 0xff, b'!']).unwrap();
        let content = reader.read_full("bin.dat").unwrap();
        assert_eq!(content.text(), "ok\u{FFFD}!");
    }

    #[test]
    fn test_read_full_errors() {
        let (reader, _dir) = setup();
        assert_eq!(reader.read_full("nope.txt").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(reader.read_full("docs").unwrap_err().kind(), ErrorKind::NotAFile);
        assert_eq!(
            reader.read_full("/etc/hostname").unwrap_err().kind(),
            ErrorKind::InvalidPath
        );
    }

    #[test]
    fn test_size_cap_boundary() {
        let (reader, dir) = setup();
        fs::write(dir.path().join("at_cap.txt"), vec![b'a'; 64]).unwrap();
        fs::write(dir.path().join("over_cap.txt"), vec![b'a'; 65]).unwrap();

        assert_eq!(reader.read_full("at_cap.txt").unwrap().text().len(), 64);
        match reader.read_full("over_cap.txt").unwrap_err() {
            SandboxError::TooLarge { size, max } => {
                assert_eq!(size, 65);
                assert_eq!(max, 64);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_unbounded_cap_reads_whole_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let config = SandboxConfig::new(dir.path())
            .unwrap()
            .with_max_file_size(u64::MAX);
        let reader = FileReader::new(Arc::new(config));

        assert_eq!(reader.read_full("a.txt").unwrap().text(), "hello");
        assert_eq!(reader.read_head("a.txt", 5).unwrap().text(), "hello");
    }

    #[test]
    fn test_protected_denied_every_way() {
        let (reader, dir) = setup();
        let root = dir.path().canonicalize().unwrap();
        symlink(root.join("flag.txt"), root.join("docs/innocent.txt")).unwrap();

        for candidate in [
            "flag.txt".to_string(),
            "docs/../flag.txt".to_string(),
            "./docs/../flag.txt".to_string(),
            root.join("flag.txt").display().to_string(),
            "docs/innocent.txt".to_string(),
        ] {
            let err = reader.read_full(&candidate).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AccessDenied, "{}", candidate);
            assert_eq!(err.caller_message(), PROTECTED_DENIAL);

            let err = reader.read_head(&candidate, 1).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AccessDenied, "{}", candidate);
        }
    }

    #[test]
    fn test_protected_checked_before_existence_and_size() {
        let (reader, dir) = setup();
        assert_eq!(
            reader.read_full("docs/flag.txt").unwrap_err().kind(),
            ErrorKind::AccessDenied
        );

        fs::write(dir.path().join("docs/flag.txt"), vec![b'x'; 1000]).unwrap();
        assert_eq!(
            reader.read_full("docs/flag.txt").unwrap_err().kind(),
            ErrorKind::AccessDenied
        );
        assert_eq!(
            reader.read_head("docs/flag.txt", 0).unwrap_err().kind(),
            ErrorKind::AccessDenied
        );
    }

    #[test]
    fn test_read_head() {
        let (reader, _dir) = setup();
        let content = reader.read_head("ten.txt", 3).unwrap();
        assert_eq!(content, FileContent::Head("line 1\nline 2\nline 3".to_string()));
    }

    #[test]
    fn test_read_head_more_than_available() {
        let (reader, _dir) = setup();
        let content = reader.read_head("docs/notes.txt", 50).unwrap();
        assert_eq!(content.text(), "hello\nworld");
    }

    #[test]
    fn test_read_head_crlf_and_empty() {
        let (reader, dir) = setup();
        fs::write(dir.path().join("dos.txt"), "a\r\nb\r\nc").unwrap();
        fs::write(dir.path().join("empty.txt"), "").unwrap();

        assert_eq!(reader.read_head("dos.txt", 10).unwrap().text(), "a\nb\nc");
        assert_eq!(reader.read_head("empty.txt", 10).unwrap().text(), "");
    }

    #[test]
    fn test_read_head_invalid_count() {
        let (reader, _dir) = setup();
        for count in [0, -1, i64::MIN] {
            let err = reader.read_head("ten.txt", count).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_read_head_line_past_cap_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("long.txt"), "0123456789ABCDEF\nsecond\n").unwrap();
        fs::write(dir.path().join("wide.txt"), "abcdefg\u{e9}xyz\n").unwrap();
        fs::write(dir.path().join("short.txt"), "abc\nlonger line\n").unwrap();
        let config = SandboxConfig::new(dir.path()).unwrap().with_max_file_size(8);
        let reader = FileReader::new(Arc::new(config));

        for (path, count) in [("long.txt", 2), ("wide.txt", 1)] {
            match reader.read_head(path, count).unwrap_err() {
                SandboxError::TooLarge { max, .. } => assert_eq!(max, 8, "{}", path),
                other => panic!("expected TooLarge for {}, got {:?}", path, other),
            }
        }

        // Lines that end within the cap are still served.
        assert_eq!(reader.read_head("short.txt", 1).unwrap().text(), "abc");
        assert_eq!(
            reader.read_head("short.txt", 2).unwrap_err().kind(),
            ErrorKind::TooLarge
        );
    }

    #[test]
    fn test_read_head_exact_cap_without_newline() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("exact.txt"), "abcdefgh").unwrap();
        let config = SandboxConfig::new(dir.path()).unwrap().with_max_file_size(8);
        let reader = FileReader::new(Arc::new(config));

        assert_eq!(reader.read_head("exact.txt", 3).unwrap().text(), "abcdefgh");
    }

    #[test]
    fn test_read_head_clamped() {
        let dir = TempDir::new().unwrap();
        let many: String = (1..=20).map(|i| format!("{}\n", i)).collect();
        fs::write(dir.path().join("many.txt"), many).unwrap();
        let config = SandboxConfig::new(dir.path()).unwrap().with_max_head_lines(5);
        let reader = FileReader::new(Arc::new(config));

        let content = reader.read_head("many.txt", i64::MAX).unwrap();
        assert_eq!(content.text(), "1\n2\n3\n4\n5");
    }
}
