//! Command line argument parsing for the docindex binaries using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::index::NewDocument;
use crate::matcher::MatcherKind;
use crate::protocol::Request;
use crate::transport::fifo::DEFAULT_SERVER_CHANNEL;

/// Verbosity flags shared by both binaries.
#[derive(Args, Debug, Clone, Default)]
pub struct VerbosityArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl VerbosityArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }

    /// Log level matching [`verbosity`](Self::verbosity).
    pub fn level_filter(&self) -> LevelFilter {
        match self.verbosity() {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

/// docindex-server - serve a document index over a named pipe
#[derive(Parser, Debug, Clone)]
#[command(name = "docindex-server")]
#[command(about = "Serve a document metadata index over a named pipe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ServerArgs {
    /// Directory that document paths are relative to
    #[arg(value_name = "DOCUMENT_ROOT")]
    pub document_root: PathBuf,

    /// Number of metadata records to cache (0 selects the default)
    #[arg(value_name = "CACHE_SIZE")]
    pub cache_size: Option<usize>,

    /// JSON configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for the index file and cache snapshot
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path of the server FIFO
    #[arg(long, value_name = "PATH", env = "DOCINDEX_CHANNEL")]
    pub channel: Option<PathBuf>,

    /// Keyword matcher used by SEARCH and LINE_COUNT
    #[arg(long, value_enum)]
    pub matcher: Option<MatcherKind>,

    #[command(flatten)]
    pub verbosity: VerbosityArgs,
}

/// docindex - client for a running docindex-server
#[derive(Parser, Debug, Clone)]
#[command(name = "docindex")]
#[command(about = "Send requests to a running docindex-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ClientArgs {
    /// Path of the server FIFO
    #[arg(long, value_name = "PATH", env = "DOCINDEX_CHANNEL", default_value = DEFAULT_SERVER_CHANNEL)]
    pub channel: PathBuf,

    /// Seconds to wait for a reply (waits forever when omitted)
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    #[command(flatten)]
    pub verbosity: VerbosityArgs,

    /// Request to send
    #[command(subcommand)]
    pub command: ClientCommand,
}

/// Requests the client can send.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Index a document
    Add {
        title: String,
        authors: String,
        year: String,
        /// Path relative to the server's document root
        path: String,
    },

    /// Show the metadata of a document
    Query { id: u32 },

    /// Remove a document from the index
    Remove { id: u32 },

    /// Count the lines of a document containing a keyword
    Lines {
        id: u32,
        /// Counts every line when omitted
        keyword: Option<String>,
    },

    /// List the documents containing a keyword
    Search {
        keyword: String,
        /// Number of search workers (sequential when omitted)
        workers: Option<usize>,
    },

    /// Stop the server
    Shutdown,
}

impl ClientCommand {
    /// The protocol request this command sends.
    pub fn to_request(&self) -> Request {
        match self {
            ClientCommand::Add {
                title,
                authors,
                year,
                path,
            } => Request::Add(NewDocument {
                title: title.clone(),
                authors: authors.clone(),
                year: year.clone(),
                path: path.clone(),
            }),
            ClientCommand::Query { id } => Request::Query(*id),
            ClientCommand::Remove { id } => Request::Remove(*id),
            ClientCommand::Lines { id, keyword } => Request::LineCount {
                id: *id,
                keyword: keyword.clone().unwrap_or_default(),
            },
            ClientCommand::Search { keyword, workers } => Request::Search {
                keyword: keyword.clone(),
                workers: workers.unwrap_or(0),
            },
            ClientCommand::Shutdown => Request::Shutdown,
        }
    }
}

/// Output format for client responses
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Response text as received
    #[default]
    Human,
    /// JSON object with the command and response
    Json,
}
