//! Bounded most-recently-used cache in front of index lookups.
//!
//! The index stays the source of truth. The cache keeps copies of records
//! ordered from most to least recently used, evicts from the back when
//! full, and counts hits and misses for reporting.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{DocId, DocumentRecord};
use crate::error::Result;
use crate::index::DocumentIndex;

/// Default number of cached records.
pub const DEFAULT_CACHE_SIZE: usize = 10;

/// Upper bound for the configured cache size.
pub const MAX_CACHE_SIZE: usize = 500;

/// One cached record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub id: DocId,
    pub record: DocumentRecord,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Most-recently-used metadata cache.
#[derive(Debug)]
pub struct MetadataCache {
    entries: VecDeque<CacheEntry>,
    capacity: usize,
    stats: CacheStats,
}

impl MetadataCache {
    /// Create a cache holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Look up `id`, consulting `index` on a miss.
    ///
    /// A hit promotes the entry to the front. A miss that the index can
    /// satisfy inserts the record at the front.
    pub fn get(&mut self, id: DocId, index: &DocumentIndex) -> Option<DocumentRecord> {
        if let Some(position) = self.entries.iter().position(|entry| entry.id == id) {
            self.stats.hits += 1;
            log::debug!("[CACHE] HIT: ID {id}");
            self.promote(position);
            return self.entries.front().map(|entry| entry.record.clone());
        }

        self.stats.misses += 1;
        log::debug!("[CACHE] MISS: ID {id}");

        let record = index.lookup(id)?.clone();
        self.put(id, record.clone());
        Some(record)
    }

    /// Insert `record` at the front unless `id` is already cached.
    ///
    /// An existing entry keeps its position.
    pub fn put(&mut self, id: DocId, record: DocumentRecord) {
        if self.capacity == 0 || self.contains(id) {
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                log::debug!("[CACHE] Evicted ID {}", evicted.id);
            }
        }

        self.entries.push_front(CacheEntry { id, record });
        log::debug!("[CACHE] ID {id} added");
    }

    /// Drop the entry for `id`, if any. Returns whether one was removed.
    pub fn invalidate(&mut self, id: DocId) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(position) => {
                self.entries.remove(position);
                log::debug!("[CACHE] ID {id} invalidated");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Cached ids, most recently used first.
    pub fn ids(&self) -> Vec<DocId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Diagnostic listing of the cache, most recently used first.
    pub fn render_snapshot(&self) -> String {
        let mut out = format!("Cache Snapshot - {} entries\n", self.entries.len());
        for entry in &self.entries {
            out.push_str(&format!("ID {}: {}\n", entry.id, entry.record.title));
        }
        out
    }

    /// Write [`render_snapshot`](Self::render_snapshot) to `path`.
    pub fn export_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        writer.write_all(self.render_snapshot().as_bytes())?;
        writer.flush()?;
        log::info!("[CACHE] Snapshot exported to {}", path.as_ref().display());
        Ok(())
    }

    fn promote(&mut self, position: usize) {
        if position == 0 {
            return;
        }
        if let Some(entry) = self.entries.remove(position) {
            log::debug!("[CACHE] ID {} moved to front", entry.id);
            self.entries.push_front(entry);
        }
    }
}
