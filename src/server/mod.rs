//! The document index server.
//!
//! [`Server`] owns every piece of mutable state: the index, the metadata
//! cache, the search engine and the persistence backend. Requests are
//! handled one at a time by [`Server::run`], so no state is shared between
//! threads except the read-only snapshot handed to search workers.

mod handlers;

pub use handlers::{Flow, Outcome};

use std::fs;
use std::sync::Arc;

use crate::cache::MetadataCache;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::index::{DocumentIndex, FlatFileStore, IndexStore};
use crate::matcher::Matcher;
use crate::protocol::{FRAME_SIZE, Frame};
use crate::search::SearchEngine;
use crate::transport::Transport;

/// Long-lived request handler.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    index: DocumentIndex,
    cache: MetadataCache,
    engine: SearchEngine,
    store: Box<dyn IndexStore>,
}

impl Server {
    /// Build a server from `config`, creating its directories and loading
    /// the persisted index.
    pub fn open(config: ServerConfig) -> Result<Self> {
        let config = config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        fs::create_dir_all(&config.document_root)?;

        let store = Box::new(FlatFileStore::new(config.index_path()));
        let matcher = config.matcher.build(&config.grep_program);
        let mut server = Self::with_store(config, store, matcher);

        let loaded = server.load()?;
        log::info!(
            "Loaded {loaded} documents, cache size {}, matcher {}",
            server.cache.capacity(),
            server.engine.matcher().name()
        );
        Ok(server)
    }

    /// Build a server over an explicit store and matcher without touching
    /// the filesystem.
    pub fn with_store(
        config: ServerConfig,
        store: Box<dyn IndexStore>,
        matcher: Arc<dyn Matcher>,
    ) -> Self {
        Self {
            index: DocumentIndex::new(&config.document_root, config.max_documents),
            cache: MetadataCache::new(config.cache_size),
            engine: SearchEngine::new(matcher),
            store,
            config,
        }
    }

    /// Replace the search engine, e.g. to install a custom worker spawner.
    pub fn with_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Restore the index from the store.
    pub fn load(&mut self) -> Result<usize> {
        self.index.load(self.store.as_ref())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Serve requests from `transport` until SHUTDOWN or until the channel
    /// closes.
    ///
    /// Every decoded frame receives exactly one reply attempt. Short reads
    /// and delivery failures are logged and skipped.
    pub fn run(&mut self, transport: &mut dyn Transport) -> Result<()> {
        let mut buf = vec![0u8; FRAME_SIZE];

        loop {
            let n = match transport.receive(&mut buf) {
                Ok(0) => {
                    log::info!("Server channel closed");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    log::error!("Failed to read request: {e}");
                    continue;
                }
            };

            if n != FRAME_SIZE {
                log::warn!("Discarding short read of {n} bytes (expected {FRAME_SIZE})");
                continue;
            }

            let frame = match Frame::decode(&buf) {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Discarding undecodable frame: {e}");
                    continue;
                }
            };

            let outcome = self.dispatch(&frame);
            self.deliver(transport, &frame.reply_channel, &outcome.response);

            if outcome.flow == Flow::Shutdown {
                log::info!("Shutdown requested");
                break;
            }
        }

        self.shutdown(transport);
        Ok(())
    }

    fn deliver(&self, transport: &mut dyn Transport, channel: &str, response: &str) {
        if let Err(e) = transport.reply(channel, response) {
            log::debug!("Dropped response to {channel}: {e}");
        }
    }

    /// Persist state and release the server channel.
    ///
    /// Failures are logged; shutdown always completes.
    fn shutdown(&mut self, transport: &mut dyn Transport) {
        self.persist();

        let stats = self.cache.stats();
        log::info!(
            "[CACHE] Stats: {} hits, {} misses, {} total",
            stats.hits,
            stats.misses,
            stats.total()
        );

        if let Err(e) = transport.close() {
            log::error!("Failed to close server channel: {e}");
        }

        let snapshot = self.config.snapshot_path();
        if let Err(e) = self.cache.export_snapshot(&snapshot) {
            log::error!("Failed to export cache snapshot to {}: {e}", snapshot.display());
        }
    }

    /// Save the index, logging instead of failing.
    fn persist(&self) {
        if let Err(e) = self.index.save(self.store.as_ref()) {
            log::error!("Failed to save index: {e}");
        }
    }
}
