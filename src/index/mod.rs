//! Document index and its persistence.

pub mod document_index;
pub mod store;

pub use document_index::{DEFAULT_MAX_DOCUMENTS, DocumentIndex, NewDocument, resolve_document_path};
pub use store::{FlatFileStore, IndexStore, MemoryStore};
