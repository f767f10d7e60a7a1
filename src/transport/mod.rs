//! Channels the server receives frames from and replies through.
//!
//! [`FifoTransport`] is the production transport built on named pipes.
//! [`MemoryTransport`] queues frames and captures replies in memory.

pub mod fifo;
pub mod memory;

pub use fifo::{FifoTransport, make_fifo, open_reply_channel, set_nonblocking, wait_readable};
pub use memory::MemoryTransport;

use crate::error::Result;

/// A connection-less request channel.
pub trait Transport: Send + std::fmt::Debug {
    /// Perform a single read from the inbound channel into `buf`.
    ///
    /// Returns the number of bytes read. A short read is not completed by
    /// further reads; `Ok(0)` means the inbound channel is closed.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Deliver `response` to the reply channel named `channel`, then close it.
    fn reply(&mut self, channel: &str, response: &str) -> Result<()>;

    /// Release the inbound channel.
    fn close(&mut self) -> Result<()>;
}
