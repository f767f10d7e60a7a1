//! In-memory transport used by tests and embedding code.

use std::collections::{HashSet, VecDeque};

use crate::error::{DocIndexError, Result};
use crate::protocol::Frame;
use crate::transport::Transport;

/// Transport backed by a queue of inbound reads and a reply log.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Vec<u8>>,
    replies: Vec<(String, String)>,
    unreachable: HashSet<String>,
    closed: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an encoded frame.
    pub fn push_frame(&mut self, frame: &Frame) -> Result<()> {
        self.inbound.push_back(frame.encode()?);
        Ok(())
    }

    /// Queue raw bytes delivered by a single read.
    pub fn push_raw(&mut self, bytes: Vec<u8>) {
        self.inbound.push_back(bytes);
    }

    /// Make replies to `channel` fail as if no reader were present.
    pub fn mark_unreachable(&mut self, channel: impl Into<String>) {
        self.unreachable.insert(channel.into());
    }

    /// Delivered replies as `(channel, response)` in delivery order.
    pub fn replies(&self) -> &[(String, String)] {
        &self.replies
    }

    /// Responses delivered to `channel`.
    pub fn replies_to(&self, channel: &str) -> Vec<&str> {
        self.replies
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, response)| response.as_str())
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for MemoryTransport {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(chunk) = self.inbound.pop_front() else {
            return Ok(0);
        };
        let len = chunk.len().min(buf.len());
        buf[..len].copy_from_slice(&chunk[..len]);
        Ok(len)
    }

    fn reply(&mut self, channel: &str, response: &str) -> Result<()> {
        if self.unreachable.contains(channel) {
            return Err(DocIndexError::other(format!(
                "No reader on reply channel {channel}"
            )));
        }
        self.replies.push((channel.to_string(), response.to_string()));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
