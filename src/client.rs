//! Client side of the FIFO protocol.
//!
//! A request is one frame written to the server channel. The client creates
//! a private reply FIFO first and opens it for reading without blocking, so
//! a reader exists by the time the server tries to deliver the response.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use crate::error::{DocIndexError, Result};
use crate::protocol::{Frame, Request};
use crate::transport::fifo::{DEFAULT_SERVER_CHANNEL, FIFO_MODE};
use crate::transport::{make_fifo, set_nonblocking, wait_readable};

/// Reply channel used by the current process.
pub fn default_reply_channel() -> PathBuf {
    PathBuf::from(format!("/tmp/docindex_{}_fifo", process::id()))
}

/// Sends requests to a running server.
#[derive(Debug, Clone)]
pub struct Client {
    server_channel: PathBuf,
    reply_channel: PathBuf,
    timeout: Option<Duration>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_CHANNEL)
    }
}

impl Client {
    pub fn new<P: AsRef<Path>>(server_channel: P) -> Self {
        Self {
            server_channel: server_channel.as_ref().to_path_buf(),
            reply_channel: default_reply_channel(),
            timeout: None,
        }
    }

    pub fn with_reply_channel<P: AsRef<Path>>(mut self, reply_channel: P) -> Self {
        self.reply_channel = reply_channel.as_ref().to_path_buf();
        self
    }

    /// Give up waiting for a reply after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server_channel(&self) -> &Path {
        &self.server_channel
    }

    pub fn reply_channel(&self) -> &Path {
        &self.reply_channel
    }

    /// Send `request` and return the server's response text.
    pub fn send(&self, request: &Request) -> Result<String> {
        let reply_channel = self.reply_channel.to_str().ok_or_else(|| {
            DocIndexError::invalid_argument(format!(
                "Reply channel is not valid UTF-8: {}",
                self.reply_channel.display()
            ))
        })?;
        let frame = Frame::new(request.command(), reply_channel, &request.to_args())?;
        let bytes = frame.encode()?;

        let guard = ReplyChannel::create(&self.reply_channel)?;
        let mut reader = guard.open_reader()?;

        self.write_frame(&bytes)?;
        log::debug!(
            "Sent {} to {}",
            request.command(),
            self.server_channel.display()
        );

        wait_readable(&reader, self.timeout)?;
        set_nonblocking(&reader, false)?;

        let mut response = Vec::new();
        reader.read_to_end(&mut response)?;
        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    fn write_frame(&self, bytes: &[u8]) -> Result<()> {
        let mut server = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.server_channel)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DocIndexError::other(format!(
                    "Server channel {} does not exist; is the server running?",
                    self.server_channel.display()
                )),
                _ if e.raw_os_error() == Some(libc::ENXIO) => DocIndexError::other(format!(
                    "No server is reading {}",
                    self.server_channel.display()
                )),
                _ => e.into(),
            })?;
        set_nonblocking(&server, false)?;
        server.write_all(bytes)?;
        Ok(())
    }
}

/// Reply FIFO removed when dropped.
struct ReplyChannel<'a> {
    path: &'a Path,
}

impl<'a> ReplyChannel<'a> {
    fn create(path: &'a Path) -> Result<Self> {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        make_fifo(path, FIFO_MODE)?;
        Ok(Self { path })
    }

    fn open_reader(&self) -> Result<File> {
        Ok(OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(self.path)?)
    }
}

impl Drop for ReplyChannel<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(self.path) {
            log::debug!("Failed to remove {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_reply_channel_uses_pid() {
        let channel = default_reply_channel();
        assert_eq!(
            channel,
            PathBuf::from(format!("/tmp/docindex_{}_fifo", process::id()))
        );
    }

    #[test]
    fn test_send_without_server_fails_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let reply = dir.path().join("reply_fifo");
        let client = Client::new(dir.path().join("no_server"))
            .with_reply_channel(&reply)
            .with_timeout(Some(Duration::from_millis(100)));

        assert!(client.send(&Request::Query(1)).is_err());
        assert!(!reply.exists());
    }

    #[test]
    fn test_send_times_out_when_nobody_answers() {
        let dir = TempDir::new().unwrap();
        let server = dir.path().join("server_fifo");
        make_fifo(&server, FIFO_MODE).unwrap();
        // Hold a reader so the client's write succeeds but nobody replies.
        let _reader = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&server)
            .unwrap();

        let client = Client::new(&server)
            .with_reply_channel(dir.path().join("reply_fifo"))
            .with_timeout(Some(Duration::from_millis(50)));
        let err = client.send(&Request::Shutdown).unwrap_err();
        assert!(matches!(err, DocIndexError::Io(ref e) if e.kind() == ErrorKind::TimedOut));
    }
}
