//! Keyword search across the document index.
//!
//! - [`partition`] splits index positions into contiguous worker ranges
//! - [`engine`] runs the matcher over those ranges and merges results in
//!   index order

pub mod engine;
pub mod partition;

pub use engine::{SearchEngine, WorkerJob, WorkerSpawner};
pub use partition::{Partition, effective_workers, plan_partitions};
