//! Keyword search over the document index.
//!
//! With one worker (or at most one document) every document is checked in
//! index order on the calling thread. Otherwise the index snapshot is split
//! into contiguous partitions and each partition is scanned by its own
//! worker thread. Partial results come back over one channel per worker and
//! are collected in partition order, which keeps the final id list in index
//! order without sorting.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, bounded};

use crate::document::{DocId, DocumentRecord};
use crate::error::{DocIndexError, Result};
use crate::index::resolve_document_path;
use crate::matcher::Matcher;
use crate::search::partition::{Partition, plan_partitions};

/// Work executed by one search worker.
pub type WorkerJob = Box<dyn FnOnce() + Send + 'static>;

/// Starts a named worker thread.
pub type WorkerSpawner = fn(String, WorkerJob) -> io::Result<JoinHandle<()>>;

fn spawn_thread(name: String, job: WorkerJob) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name).spawn(job)
}

/// Partition-parallel keyword search engine.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    matcher: Arc<dyn Matcher>,
    spawner: WorkerSpawner,
}

struct Worker {
    partition: Partition,
    results: Receiver<Vec<DocId>>,
    handle: JoinHandle<()>,
}

impl SearchEngine {
    pub fn new(matcher: Arc<dyn Matcher>) -> Self {
        Self {
            matcher,
            spawner: spawn_thread,
        }
    }

    /// Use a custom function to start worker threads.
    pub fn with_spawner(mut self, spawner: WorkerSpawner) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn matcher(&self) -> &Arc<dyn Matcher> {
        &self.matcher
    }

    /// Ids of the documents containing `keyword`, in index order.
    ///
    /// `worker_count` is advisory and clamped to `[1, documents.len()]`.
    /// Per-document matcher failures only drop that document. If a worker
    /// cannot be started the workers already running are stopped and the
    /// whole search fails.
    pub fn search(
        &self,
        keyword: &str,
        worker_count: usize,
        documents: &[DocumentRecord],
        document_root: &Path,
    ) -> Result<Vec<DocId>> {
        if keyword.is_empty() {
            return Err(DocIndexError::invalid_argument("Empty search keyword"));
        }

        let started = Instant::now();
        let ids = if worker_count <= 1 || documents.len() <= 1 {
            scan(self.matcher.as_ref(), keyword, documents, document_root, None)
        } else {
            self.search_partitioned(keyword, worker_count, documents, document_root)?
        };

        log::debug!(
            "Search for '{keyword}' ({} worker(s) requested) matched {} of {} documents in {:?}",
            worker_count.max(1),
            ids.len(),
            documents.len(),
            started.elapsed()
        );
        Ok(ids)
    }

    fn search_partitioned(
        &self,
        keyword: &str,
        worker_count: usize,
        documents: &[DocumentRecord],
        document_root: &Path,
    ) -> Result<Vec<DocId>> {
        let snapshot: Arc<[DocumentRecord]> = Arc::from(documents);
        let keyword: Arc<str> = Arc::from(keyword);
        let root: Arc<PathBuf> = Arc::new(document_root.to_path_buf());
        let cancelled = Arc::new(AtomicBool::new(false));

        let partitions = plan_partitions(snapshot.len(), worker_count);
        let mut workers = Vec::with_capacity(partitions.len());

        for partition in partitions {
            let (tx, rx) = bounded(1);
            let matcher = Arc::clone(&self.matcher);
            let snapshot = Arc::clone(&snapshot);
            let keyword = Arc::clone(&keyword);
            let root = Arc::clone(&root);
            let cancelled_flag = Arc::clone(&cancelled);

            let job: WorkerJob = Box::new(move || {
                let ids = scan(
                    matcher.as_ref(),
                    &keyword,
                    &snapshot[partition.range()],
                    &root,
                    Some(&cancelled_flag),
                );
                let _ = tx.send(ids);
            });

            match (self.spawner)(format!("search-worker-{}", partition.index), job) {
                Ok(handle) => workers.push(Worker {
                    partition,
                    results: rx,
                    handle,
                }),
                Err(e) => {
                    log::error!(
                        "Failed to start search worker {}: {e}; stopping {} running worker(s)",
                        partition.index,
                        workers.len()
                    );
                    cancelled.store(true, Ordering::SeqCst);
                    for worker in workers {
                        let _ = worker.handle.join();
                    }
                    return Err(DocIndexError::spawn(format!(
                        "Failed to start search worker {}: {e}",
                        partition.index
                    )));
                }
            }
        }

        let mut ids = Vec::new();
        for worker in workers {
            match worker.results.recv() {
                Ok(partial) => ids.extend(partial),
                Err(_) => log::warn!(
                    "Search worker {} (positions {:?}) returned no result",
                    worker.partition.index,
                    worker.partition.range()
                ),
            }
            if worker.handle.join().is_err() {
                log::warn!("Search worker {} panicked", worker.partition.index);
            }
        }
        Ok(ids)
    }
}

/// Check each document in order and keep the ids that match.
fn scan(
    matcher: &dyn Matcher,
    keyword: &str,
    documents: &[DocumentRecord],
    document_root: &Path,
    cancelled: Option<&AtomicBool>,
) -> Vec<DocId> {
    let mut ids = Vec::new();
    for document in documents {
        if cancelled.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            return Vec::new();
        }
        let path = match resolve_document_path(document_root, &document.path) {
            Ok(path) => path,
            Err(e) => {
                log::debug!("Skipping document {}: {e}", document.id);
                continue;
            }
        };
        match matcher.matches(keyword, &path) {
            Ok(true) => ids.push(document.id),
            Ok(false) => {}
            Err(e) => log::debug!("Skipping document {}: {e}", document.id),
        }
    }
    ids
}
