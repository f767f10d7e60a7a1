//! # docindex
//!
//! A single-host document metadata index served over named pipes.
//!
//! ## Features
//!
//! - Fixed-size request frames on a well-known FIFO, replies on per-client FIFOs
//! - Flat-file persistence of the document index
//! - Bounded most-recently-used metadata cache with hit/miss statistics
//! - Keyword search partitioned across worker threads
//! - Matching and line counting delegated to `grep` or done in-process

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod matcher;
pub mod protocol;
pub mod search;
pub mod server;
pub mod transport;
pub mod util;

pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::ServerConfig;
    pub use crate::error::{DocIndexError, Result};
    pub use crate::protocol::Request;
    pub use crate::server::Server;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
