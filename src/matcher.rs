//! Keyword matching against document files.
//!
//! The service does not implement text matching itself. [`GrepMatcher`]
//! delegates each check to an external `grep` process; [`SubstringMatcher`]
//! performs a plain line scan in-process and needs no external tools.
//!
//! The two do not agree on metacharacters: `GrepMatcher` passes the keyword
//! to grep as a basic regular expression, so `w.ale` matches `whale`, while
//! `SubstringMatcher` only finds the literal text.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{DocIndexError, Result};

/// Decides whether, and how often, a keyword occurs in a document.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Whether at least one line of `path` matches `pattern`.
    fn matches(&self, pattern: &str, path: &Path) -> Result<bool>;

    /// Number of lines of `path` matching `pattern`.
    fn count_lines(&self, pattern: &str, path: &Path) -> Result<u64>;

    /// Short name for logging.
    fn name(&self) -> &str;
}

/// Available matcher implementations.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// Spawn the external grep utility per document
    #[default]
    Grep,
    /// Scan lines in-process
    Substring,
}

impl MatcherKind {
    /// Instantiate the matcher. `grep_program` is only used by [`MatcherKind::Grep`].
    pub fn build(self, grep_program: &Path) -> Arc<dyn Matcher> {
        match self {
            MatcherKind::Grep => Arc::new(GrepMatcher::with_program(grep_program)),
            MatcherKind::Substring => Arc::new(SubstringMatcher),
        }
    }
}

/// Matcher backed by an external `grep` process.
#[derive(Debug, Clone)]
pub struct GrepMatcher {
    program: PathBuf,
}

impl Default for GrepMatcher {
    fn default() -> Self {
        Self::with_program("grep")
    }
}

impl GrepMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program<P: AsRef<Path>>(program: P) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }

    fn command(&self, mode: &str, pattern: &str, path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(mode)
            .arg("-e")
            .arg(pattern)
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Matcher for GrepMatcher {
    fn matches(&self, pattern: &str, path: &Path) -> Result<bool> {
        let status = self
            .command("-q", pattern, path)
            .stdout(Stdio::null())
            .status()
            .map_err(|e| {
                DocIndexError::spawn(format!("Failed to run {}: {e}", self.program.display()))
            })?;
        Ok(status.success())
    }

    fn count_lines(&self, pattern: &str, path: &Path) -> Result<u64> {
        let output = self
            .command("-c", pattern, path)
            .stdout(Stdio::piped())
            .output()
            .map_err(|e| {
                DocIndexError::spawn(format!("Failed to run {}: {e}", self.program.display()))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let count = stdout.trim();
        if count.is_empty() {
            return Ok(0);
        }
        count.parse().map_err(|_| {
            DocIndexError::other(format!("Unexpected line counter output: {count}"))
        })
    }

    fn name(&self) -> &str {
        "grep"
    }
}

/// In-process line scanner using plain substring containment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl SubstringMatcher {
    fn read(path: &Path) -> Result<String> {
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Matcher for SubstringMatcher {
    fn matches(&self, pattern: &str, path: &Path) -> Result<bool> {
        let text = Self::read(path)?;
        Ok(text.lines().any(|line| line.contains(pattern)))
    }

    fn count_lines(&self, pattern: &str, path: &Path) -> Result<u64> {
        let text = Self::read(path)?;
        Ok(text.lines().filter(|line| line.contains(pattern)).count() as u64)
    }

    fn name(&self) -> &str {
        "substring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_doc(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_substring_matcher() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.txt", "the whale\nno match\nwhale again\n");

        let matcher = SubstringMatcher;
        assert!(matcher.matches("whale", &path).unwrap());
        assert!(!matcher.matches("shark", &path).unwrap());
        assert_eq!(matcher.count_lines("whale", &path).unwrap(), 2);
        assert_eq!(matcher.count_lines("", &path).unwrap(), 3);
    }

    #[test]
    fn test_substring_matcher_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(SubstringMatcher.matches("x", &missing).is_err());
    }

    #[test]
    fn test_grep_matcher() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.txt", "the whale\nnothing\nwhale\n");

        let matcher = GrepMatcher::new();
        assert!(matcher.matches("whale", &path).unwrap());
        assert!(!matcher.matches("shark", &path).unwrap());
        assert_eq!(matcher.count_lines("whale", &path).unwrap(), 2);
        assert_eq!(matcher.count_lines("shark", &path).unwrap(), 0);
        assert_eq!(matcher.count_lines("", &path).unwrap(), 3);
    }

    #[test]
    fn test_grep_matcher_uses_regular_expressions() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.txt", "the whale\n");

        assert!(GrepMatcher::new().matches("w.ale", &path).unwrap());
        assert!(!SubstringMatcher.matches("w.ale", &path).unwrap());
    }

    #[test]
    fn test_grep_matcher_without_output_counts_zero() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");

        let matcher = GrepMatcher::new();
        assert_eq!(matcher.count_lines("whale", &missing).unwrap(), 0);
        assert!(!matcher.matches("whale", &missing).unwrap());
    }

    #[test]
    fn test_grep_matcher_missing_program() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.txt", "text\n");
        let matcher = GrepMatcher::with_program(dir.path().join("no-such-grep"));

        let err = matcher.matches("text", &path).unwrap_err();
        assert!(matches!(err, DocIndexError::Spawn(_)));
        assert!(matcher.count_lines("text", &path).is_err());
    }

    #[test]
    fn test_matcher_kind_build() {
        let matcher = MatcherKind::Substring.build(Path::new("grep"));
        assert_eq!(matcher.name(), "substring");
        assert_eq!(MatcherKind::default(), MatcherKind::Grep);
    }
}
