//! Response rendering.
//!
//! Responses are plain text, one per request, bounded to
//! [`MAX_RESPONSE_SIZE`] bytes.

use crate::document::DocId;
use crate::util::truncate_string;

/// Largest response delivered to a client, in bytes.
pub const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Response sent when a search cannot be performed.
pub const EMPTY_ID_LIST: &str = "[]";

/// Clamp `response` to [`MAX_RESPONSE_SIZE`].
pub fn bound_response(response: String) -> String {
    if response.len() <= MAX_RESPONSE_SIZE {
        return response;
    }
    log::warn!(
        "Response truncated from {} to {MAX_RESPONSE_SIZE} bytes",
        response.len()
    );
    truncate_string(response, MAX_RESPONSE_SIZE)
}

/// Render ids as `[3, 7, 9]`.
pub fn format_id_list(ids: &[DocId]) -> String {
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}
