//! Wire framing shared by the AST server and its clients.
//!
//! Every message is a 4-byte big-endian signed length followed by that many
//! bytes of UTF-8 JSON. One request and one response travel per connection.

mod frame;

pub use frame::{
    read_frame, read_text_frame, write_frame, FrameError, DEFAULT_MAX_FRAME_BYTES,
};
