pub mod types;
pub mod wire;

pub use types::{command, Message};
pub use wire::{
    encode_line, MessageReader, MessageWriter, WireConfig, WireProtocolError,
    DEFAULT_CONNECT_TIMEOUT, LINE_TERMINATOR, MAX_LINE_LENGTH,
};
