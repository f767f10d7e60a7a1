//! Fixed-size request frames.
//!
//! The server channel carries no message boundaries, so every request is a
//! frame of exactly [`FRAME_SIZE`] bytes written and read as one unit:
//!
//! ```text
//! +----------------+---------------------------+---------------------+
//! | command u32 LE | reply channel (256 bytes) | args (512 bytes)    |
//! +----------------+---------------------------+---------------------+
//! ```
//!
//! String fields are NUL-padded. When decoding, the last byte of each field
//! is treated as NUL whatever was received.

use std::fmt;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{DocIndexError, Result};

/// Size of the reply channel field in bytes.
pub const REPLY_CHANNEL_SIZE: usize = 256;

/// Size of the argument field in bytes.
pub const ARGS_SIZE: usize = 512;

/// Total frame size in bytes.
pub const FRAME_SIZE: usize = 4 + REPLY_CHANNEL_SIZE + ARGS_SIZE;

/// Commands understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Add,
    Query,
    Remove,
    LineCount,
    Search,
    Shutdown,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Add,
        Command::Query,
        Command::Remove,
        Command::LineCount,
        Command::Search,
        Command::Shutdown,
    ];

    /// Wire code of this command.
    pub fn code(self) -> u32 {
        match self {
            Command::Add => 0,
            Command::Query => 1,
            Command::Remove => 2,
            Command::LineCount => 3,
            Command::Search => 4,
            Command::Shutdown => 5,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.code() == code)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Add => "ADD",
            Command::Query => "QUERY",
            Command::Remove => "REMOVE",
            Command::LineCount => "LINE_COUNT",
            Command::Search => "SEARCH",
            Command::Shutdown => "SHUTDOWN",
        };
        f.write_str(name)
    }
}

/// One decoded request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw command code; may not correspond to a known [`Command`].
    pub code: u32,
    /// Where the response must be delivered.
    pub reply_channel: String,
    /// Command-specific, `|`-delimited arguments.
    pub args: String,
}

impl Frame {
    /// Build a frame, checking that every field fits.
    pub fn new(command: Command, reply_channel: &str, args: &str) -> Result<Self> {
        check_field("reply channel", reply_channel, REPLY_CHANNEL_SIZE)?;
        check_field("arguments", args, ARGS_SIZE)?;
        Ok(Self {
            code: command.code(),
            reply_channel: reply_channel.to_string(),
            args: args.to_string(),
        })
    }

    /// The command, if the code is known.
    pub fn command(&self) -> Option<Command> {
        Command::from_code(self.code)
    }

    /// Serialize into exactly [`FRAME_SIZE`] bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        check_field("reply channel", &self.reply_channel, REPLY_CHANNEL_SIZE)?;
        check_field("arguments", &self.args, ARGS_SIZE)?;

        let mut buf = Vec::with_capacity(FRAME_SIZE);
        buf.write_u32::<LittleEndian>(self.code)?;
        write_padded(&mut buf, &self.reply_channel, REPLY_CHANNEL_SIZE)?;
        write_padded(&mut buf, &self.args, ARGS_SIZE)?;
        debug_assert_eq!(buf.len(), FRAME_SIZE);
        Ok(buf)
    }

    /// Parse a frame. `bytes` must be exactly [`FRAME_SIZE`] long.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FRAME_SIZE {
            return Err(DocIndexError::invalid_frame(format!(
                "expected {FRAME_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let code = cursor.read_u32::<LittleEndian>()?;
        let reply_channel = read_terminated(&mut cursor, REPLY_CHANNEL_SIZE)?;
        let args = read_terminated(&mut cursor, ARGS_SIZE)?;

        Ok(Self {
            code,
            reply_channel,
            args,
        })
    }
}

fn check_field(name: &str, value: &str, size: usize) -> Result<()> {
    if value.len() >= size {
        return Err(DocIndexError::invalid_argument(format!(
            "{name} too long: {} bytes (limit {})",
            value.len(),
            size - 1
        )));
    }
    if value.contains('\0') {
        return Err(DocIndexError::invalid_argument(format!(
            "{name} contains a NUL byte"
        )));
    }
    Ok(())
}

fn write_padded<W: Write>(writer: &mut W, value: &str, size: usize) -> Result<()> {
    let mut field = vec![0u8; size];
    field[..value.len()].copy_from_slice(value.as_bytes());
    writer.write_all(&field)?;
    Ok(())
}

fn read_terminated<R: Read>(reader: &mut R, size: usize) -> Result<String> {
    let mut field = vec![0u8; size];
    reader.read_exact(&mut field)?;
    field[size - 1] = 0;
    let len = field.iter().position(|&b| b == 0).unwrap_or(size - 1);
    Ok(String::from_utf8_lossy(&field[..len]).into_owned())
}
