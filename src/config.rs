//! Server configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_CACHE_SIZE, MAX_CACHE_SIZE};
use crate::document::MAX_DOCUMENT_ROOT;
use crate::error::{DocIndexError, Result};
use crate::index::DEFAULT_MAX_DOCUMENTS;
use crate::matcher::MatcherKind;
use crate::transport::fifo::DEFAULT_SERVER_CHANNEL;

/// Configuration for the document index server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory document paths are relative to.
    pub document_root: PathBuf,

    /// Number of records kept in the metadata cache.
    pub cache_size: usize,

    /// Maximum number of indexed documents.
    pub max_documents: usize,

    /// Directory holding the index file and the cache snapshot.
    pub data_dir: PathBuf,

    /// Index file name inside `data_dir`.
    pub index_file: String,

    /// Cache snapshot file name inside `data_dir`.
    pub snapshot_file: String,

    /// Well-known FIFO clients send requests to.
    pub server_channel: PathBuf,

    /// Keyword matcher implementation.
    pub matcher: MatcherKind,

    /// Program used by the grep matcher.
    pub grep_program: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("."),
            cache_size: DEFAULT_CACHE_SIZE,
            max_documents: DEFAULT_MAX_DOCUMENTS,
            data_dir: PathBuf::from("data"),
            index_file: "index.txt".to_string(),
            snapshot_file: "cache_snapshot.txt".to_string(),
            server_channel: PathBuf::from(DEFAULT_SERVER_CHANNEL),
            matcher: MatcherKind::default(),
            grep_program: PathBuf::from("grep"),
        }
    }
}

impl ServerConfig {
    /// Create a config for `document_root` with defaults elsewhere.
    pub fn new<P: AsRef<Path>>(document_root: P) -> Self {
        Self {
            document_root: document_root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Load a JSON config file. Missing keys take their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            DocIndexError::invalid_config(format!(
                "Cannot read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Set the cache size. Zero selects the default; values above
    /// [`MAX_CACHE_SIZE`] are clamped.
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = normalize_cache_size(cache_size);
        self
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_server_channel<P: AsRef<Path>>(mut self, channel: P) -> Self {
        self.server_channel = channel.as_ref().to_path_buf();
        self
    }

    pub fn with_matcher(mut self, matcher: MatcherKind) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.max_documents = max_documents;
        self
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.index_file)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    /// Check the configuration, normalising the cache size.
    pub fn validate(mut self) -> Result<Self> {
        self.cache_size = normalize_cache_size(self.cache_size);

        if self.max_documents == 0 {
            return Err(DocIndexError::invalid_config(
                "max_documents must be greater than zero",
            ));
        }
        if self.document_root.as_os_str().len() > MAX_DOCUMENT_ROOT {
            return Err(DocIndexError::invalid_config(format!(
                "Document root path too long: {}",
                self.document_root.display()
            )));
        }
        if self.index_file.is_empty() || self.snapshot_file.is_empty() {
            return Err(DocIndexError::invalid_config(
                "index_file and snapshot_file must not be empty",
            ));
        }
        Ok(self)
    }
}

fn normalize_cache_size(cache_size: usize) -> usize {
    match cache_size {
        0 => DEFAULT_CACHE_SIZE,
        n => n.min(MAX_CACHE_SIZE),
    }
}
