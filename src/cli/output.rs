//! Output formatting for client responses.

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::error::Result;
use crate::protocol::Command;

/// Printed on stderr when the server closed the reply without writing.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Error: Empty response from server";

/// A server response paired with the command that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOutput {
    pub command: String,
    pub response: String,
}

impl ResponseOutput {
    pub fn new(command: Command, response: String) -> Self {
        Self {
            command: command.to_string(),
            response,
        }
    }
}

/// Render `output` in `format`, without a trailing newline.
pub fn render_response(output: &ResponseOutput, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(output.response.clone()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
    }
}

/// Print a response. Empty responses are reported on stderr.
pub fn output_response(output: &ResponseOutput, format: OutputFormat) -> Result<()> {
    if output.response.is_empty() {
        eprintln!("{EMPTY_RESPONSE_MESSAGE}");
        return Ok(());
    }
    println!("{}", render_response(output, format)?);
    Ok(())
}
