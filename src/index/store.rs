//! Persistence backends for the document index.
//!
//! The on-disk format is one record per line, `id|title|authors|year|path`,
//! rewritten in full on every save. Backslash, `|`, CR and LF inside a
//! field are written as `\\`, `\|`, `\r` and `\n`.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::document::{DocId, DocumentRecord, MAX_AUTHORS, MAX_PATH, MAX_TITLE, MAX_YEAR};
use crate::error::{DocIndexError, Result};

/// A place the index can be saved to and restored from.
pub trait IndexStore: Send + Sync + std::fmt::Debug {
    /// Read at most `limit` records. A store that was never written yields
    /// an empty list.
    fn load(&self, limit: usize) -> Result<Vec<DocumentRecord>>;

    /// Replace the stored contents with `records`.
    fn save(&self, records: &[DocumentRecord]) -> Result<()>;
}

/// Line-oriented flat file store.
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    path: PathBuf,
}

impl FlatFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexStore for FlatFileStore {
    fn load(&self, limit: usize) -> Result<Vec<DocumentRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            if records.len() >= limit {
                log::warn!(
                    "Index file {} holds more than {limit} documents; ignoring the rest",
                    self.path.display()
                );
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(&line) {
                Some(record) => records.push(record),
                None => log::warn!(
                    "Skipping malformed line {} in {}",
                    line_num + 1,
                    self.path.display()
                ),
            }
        }
        Ok(records)
    }

    fn save(&self, records: &[DocumentRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        for record in records {
            writeln!(writer, "{}", format_record(record))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// In-memory store, handy for tests and for running without a data dir.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<DocumentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records currently held by the store.
    pub fn snapshot(&self) -> Result<Vec<DocumentRecord>> {
        self.records
            .lock()
            .map(|records| records.clone())
            .map_err(|_| DocIndexError::other("Memory store lock poisoned"))
    }
}

impl IndexStore for MemoryStore {
    fn load(&self, limit: usize) -> Result<Vec<DocumentRecord>> {
        let mut records = self.snapshot()?;
        records.truncate(limit);
        Ok(records)
    }

    fn save(&self, records: &[DocumentRecord]) -> Result<()> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| DocIndexError::other("Memory store lock poisoned"))?;
        *stored = records.to_vec();
        Ok(())
    }
}

/// Render one record in the persisted line format.
pub fn format_record(record: &DocumentRecord) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        record.id,
        escape_field(&record.title),
        escape_field(&record.authors),
        escape_field(&record.year),
        escape_field(&record.path)
    )
}

/// Parse one persisted line.
pub fn parse_record(line: &str) -> Option<DocumentRecord> {
    let fields = split_fields(line.trim_end_matches('\r'))?;
    let [id, title, authors, year, path] = fields.as_slice() else {
        return None;
    };
    let id: DocId = id.trim().parse().ok()?;

    if id == 0 {
        return None;
    }
    let bounded = [
        (title, MAX_TITLE),
        (authors, MAX_AUTHORS),
        (year, MAX_YEAR),
        (path, MAX_PATH),
    ];
    if bounded
        .iter()
        .any(|(value, max)| value.is_empty() || value.len() > *max)
    {
        return None;
    }

    Some(DocumentRecord::new(
        id,
        title.as_str(),
        authors.as_str(),
        year.as_str(),
        path.as_str(),
    ))
}

fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Split on unescaped `|`, resolving escapes. `None` on a dangling or
/// unknown escape.
fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                '\\' => current.push('\\'),
                '|' => current.push('|'),
                'n' => current.push('\n'),
                'r' => current.push('\r'),
                _ => return None,
            },
            '|' => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    Some(fields)
}
