//! The authoritative, ordered collection of document records.

use std::path::{Component, Path, PathBuf};

use crate::document::{DocId, DocumentRecord, MAX_FULL_PATH, extract_metadata};
use crate::error::{DocIndexError, Result};
use crate::index::store::IndexStore;

/// Default maximum number of documents held by an index.
pub const DEFAULT_MAX_DOCUMENTS: usize = 2500;

/// Fields supplied by a client when adding a document.
///
/// `title` and `authors` are hints only: the index replaces them with the
/// values extracted from the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub title: String,
    pub authors: String,
    pub year: String,
    pub path: String,
}

/// Ordered document index.
///
/// Records keep insertion order; removal closes the gap. Positions are
/// stable for as long as the index is not mutated, which the search engine
/// relies on when partitioning.
#[derive(Debug)]
pub struct DocumentIndex {
    records: Vec<DocumentRecord>,
    next_id: DocId,
    capacity: usize,
    document_root: PathBuf,
}

impl DocumentIndex {
    /// Create an empty index rooted at `document_root`.
    pub fn new<P: AsRef<Path>>(document_root: P, capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            capacity,
            document_root: document_root.as_ref().to_path_buf(),
        }
    }

    /// Add a document and return its newly assigned id.
    pub fn add(&mut self, document: NewDocument) -> Result<DocId> {
        if self.records.len() >= self.capacity {
            return Err(DocIndexError::CapacityExceeded(self.capacity));
        }

        let full_path = self.resolve_path(&document.path)?;
        let metadata = extract_metadata(&full_path);
        let id = self.next_id;
        self.next_id += 1;

        self.records.push(DocumentRecord::new(
            id,
            metadata.title,
            metadata.author,
            document.year,
            document.path,
        ));
        log::debug!("Indexed document {id}");
        Ok(id)
    }

    /// Remove the document with `id`, returning its record.
    pub fn remove(&mut self, id: DocId) -> Result<DocumentRecord> {
        let position = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(DocIndexError::NotFound(id))?;
        Ok(self.records.remove(position))
    }

    /// Look up a document by id.
    pub fn lookup(&self, id: DocId) -> Option<&DocumentRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Record at `position` in index order.
    pub fn get(&self, position: usize) -> Option<&DocumentRecord> {
        self.records.get(position)
    }

    /// All records in index order.
    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Id the next successful `add` will assign.
    pub fn next_id(&self) -> DocId {
        self.next_id
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    /// Resolve a stored relative path against the document root.
    pub fn resolve_path(&self, relative: &str) -> Result<PathBuf> {
        resolve_document_path(&self.document_root, relative)
    }

    /// Replace the current contents with `records`.
    ///
    /// The id counter resumes after the largest restored id. Records beyond
    /// the capacity are dropped.
    pub fn restore(&mut self, mut records: Vec<DocumentRecord>) {
        records.truncate(self.capacity);
        self.next_id = records.iter().map(|r| r.id).max().map_or(1, |max| max + 1);
        self.records = records;
    }

    /// Restore from `store`, returning the number of documents loaded.
    pub fn load(&mut self, store: &dyn IndexStore) -> Result<usize> {
        let records = store.load(self.capacity)?;
        self.restore(records);
        Ok(self.records.len())
    }

    /// Persist the current contents to `store`.
    pub fn save(&self, store: &dyn IndexStore) -> Result<()> {
        store.save(&self.records)
    }
}

/// Join `relative` onto `root`.
///
/// Absolute paths and `..` components are rejected with
/// [`DocIndexError::OutsideRoot`]; results longer than [`MAX_FULL_PATH`]
/// with [`DocIndexError::InvalidArgument`].
pub fn resolve_document_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let escapes = Path::new(relative).components().any(|c| {
        matches!(
            c,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    });
    if escapes {
        return Err(DocIndexError::OutsideRoot(relative.to_string()));
    }

    let full = root.join(relative);
    if full.as_os_str().len() > MAX_FULL_PATH {
        return Err(DocIndexError::invalid_argument(format!(
            "Path too long: {}",
            full.display()
        )));
    }
    Ok(full)
}
