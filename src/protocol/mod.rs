//! Request/response protocol spoken over the server channel.

pub mod frame;
pub mod request;
pub mod response;

pub use frame::{ARGS_SIZE, Command, FRAME_SIZE, Frame, REPLY_CHANNEL_SIZE};
pub use request::{ArgumentError, MAX_KEYWORD, Request};
pub use response::{EMPTY_ID_LIST, MAX_RESPONSE_SIZE, bound_response, format_id_list};
