//! Named-pipe transport.
//!
//! The server owns one well-known FIFO that clients write frames into.
//! Each client owns a private FIFO named in its frame; the server opens it
//! write-only without blocking, writes the response and closes it. If no
//! reader is present the open fails and the response is dropped.

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DocIndexError, Result};
use crate::transport::Transport;

/// Default location of the server FIFO.
pub const DEFAULT_SERVER_CHANNEL: &str = "/tmp/docindex_server_fifo";

/// Permissions used for created FIFOs.
pub const FIFO_MODE: u32 = 0o666;

/// Create a FIFO at `path`. An existing FIFO is reused.
pub fn make_fifo(path: &Path, mode: u32) -> Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        DocIndexError::invalid_argument(format!("FIFO path contains NUL: {}", path.display()))
    })?;

    // SAFETY: `c_path` is a valid NUL-terminated string for the duration of the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), mode as libc::mode_t) };
    if rc == -1 {
        let err = io::Error::last_os_error();
        if err.kind() != ErrorKind::AlreadyExists {
            return Err(err.into());
        }
    }
    Ok(())
}

/// Toggle `O_NONBLOCK` on an open file.
pub fn set_nonblocking(file: &File, nonblocking: bool) -> Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: `fd` is owned by `file` and stays open for both calls.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error().into());
    }
    let flags = if nonblocking {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } == -1 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}

/// Block until `file` is readable or hung up. `None` waits indefinitely.
pub fn wait_readable(file: &File, timeout: Option<Duration>) -> Result<()> {
    let timeout_ms = timeout.map_or(-1, |t| {
        t.as_millis().min(libc::c_int::MAX as u128) as libc::c_int
    });
    let mut pollfd = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };

    loop {
        // SAFETY: `pollfd` points to exactly one valid pollfd structure.
        let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        match rc {
            -1 => {
                let err = io::Error::last_os_error();
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(err.into());
            }
            0 => {
                let err = io::Error::new(ErrorKind::TimedOut, "timed out waiting for reply");
                return Err(err.into());
            }
            _ => return Ok(()),
        }
    }
}

/// Open a reply channel for writing without waiting for a reader.
///
/// Anything other than a FIFO is refused before a byte is written. The
/// returned file is switched back to blocking mode so the whole response
/// can be written.
pub fn open_reply_channel(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)?;
    if !file.metadata()?.file_type().is_fifo() {
        return Err(DocIndexError::invalid_argument(format!(
            "Reply channel {} is not a FIFO",
            path.display()
        )));
    }
    set_nonblocking(&file, false)?;
    Ok(file)
}

/// Transport reading frames from a server FIFO.
#[derive(Debug)]
pub struct FifoTransport {
    path: PathBuf,
    inbound: Option<File>,
}

impl FifoTransport {
    /// Create the server FIFO at `path`, replacing any stale one, and open
    /// it for reading.
    ///
    /// The FIFO is opened read-write so reads block while no client is
    /// connected instead of reporting end of file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("Removed stale channel {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        make_fifo(&path, FIFO_MODE)?;

        let inbound = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => file,
            Err(e) => {
                let _ = fs::remove_file(&path);
                return Err(e.into());
            }
        };

        log::info!("Listening on {}", path.display());
        Ok(Self {
            path,
            inbound: Some(inbound),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for FifoTransport {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        let inbound = self
            .inbound
            .as_mut()
            .ok_or_else(|| DocIndexError::other("Server channel is closed"))?;
        loop {
            match inbound.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn reply(&mut self, channel: &str, response: &str) -> Result<()> {
        let mut file = open_reply_channel(Path::new(channel))?;
        file.write_all(response.as_bytes())?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.inbound.take().is_some() {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            log::info!("Closed {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for FifoTransport {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to remove {}: {e}", self.path.display());
        }
    }
}
