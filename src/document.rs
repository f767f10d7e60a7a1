//! Document records and the metadata extraction used when indexing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::truncate_string;

/// Identifier assigned by the index. Ids start at 1 and are never reused
/// within a run.
pub type DocId = u32;

/// Maximum title length in bytes.
pub const MAX_TITLE: usize = 200;

/// Maximum authors length in bytes.
pub const MAX_AUTHORS: usize = 200;

/// Maximum year length in bytes.
pub const MAX_YEAR: usize = 4;

/// Maximum document path length in bytes, relative to the document root.
pub const MAX_PATH: usize = 64;

/// Maximum length of the configured document root in bytes.
pub const MAX_DOCUMENT_ROOT: usize = 255;

/// Maximum length of a resolved path (document root + relative path).
pub const MAX_FULL_PATH: usize = MAX_PATH + MAX_DOCUMENT_ROOT + 1;

/// Placeholder stored when extraction finds no title or author.
pub const UNKNOWN_FIELD: &str = "Unknown";

const TITLE_LABEL: &str = "Title:";
const AUTHOR_LABEL: &str = "Author:";

/// Metadata of one indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocId,
    pub title: String,
    pub authors: String,
    pub year: String,
    /// Path relative to the configured document root.
    pub path: String,
}

impl DocumentRecord {
    /// Build a record, clamping every field to its bound.
    pub fn new(
        id: DocId,
        title: impl Into<String>,
        authors: impl Into<String>,
        year: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: truncate_string(title.into(), MAX_TITLE),
            authors: truncate_string(authors.into(), MAX_AUTHORS),
            year: truncate_string(year.into(), MAX_YEAR),
            path: truncate_string(path.into(), MAX_PATH),
        }
    }

    /// Human-readable rendering used by the QUERY response.
    pub fn describe(&self) -> String {
        format!(
            "Title: {}\nAuthors: {}\nYear: {}\nPath: {}",
            self.title, self.authors, self.year, self.path
        )
    }
}

/// Title and author found in a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub title: String,
    pub author: String,
}

impl Default for ExtractedMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_FIELD.to_string(),
            author: UNKNOWN_FIELD.to_string(),
        }
    }
}

/// Scan a document for its first `Title:` and `Author:` lines.
///
/// The value is whatever follows the label and a single separator
/// character. A missing label, an empty value, or an unreadable file
/// yields [`UNKNOWN_FIELD`] for that field.
pub fn extract_metadata(path: &Path) -> ExtractedMetadata {
    let mut metadata = ExtractedMetadata::default();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            log::debug!("Cannot read metadata from {}: {e}", path.display());
            return metadata;
        }
    };

    let mut reader = BufReader::new(file);
    let mut raw = Vec::new();
    let mut title = None;
    let mut author = None;

    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!("Stopped reading {}: {e}", path.display());
                break;
            }
        }
        let line = String::from_utf8_lossy(&raw);

        if title.is_none() {
            if let Some(value) = label_value(&line, TITLE_LABEL) {
                title = Some(truncate_string(value, MAX_TITLE));
                continue;
            }
        }
        if author.is_none() {
            if let Some(value) = label_value(&line, AUTHOR_LABEL) {
                author = Some(truncate_string(value, MAX_AUTHORS));
            }
        }
        if title.is_some() && author.is_some() {
            break;
        }
    }

    if let Some(title) = title.filter(|t| !t.is_empty()) {
        metadata.title = title;
    }
    if let Some(author) = author.filter(|a| !a.is_empty()) {
        metadata.author = author;
    }
    metadata
}

fn label_value(line: &str, label: &str) -> Option<String> {
    let rest = line.strip_prefix(label)?;
    let mut chars = rest.chars();
    chars.next();
    let value = chars.as_str().trim_end_matches(['\r', '\n']);
    Some(value.to_string())
}
