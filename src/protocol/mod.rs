//! Protocol Module
//!
//! Defines the wire protocol between client and server.
//!
//! ## Protocol Format (Big-Endian)
//!
//! The protocol is unidirectional: the client pushes, the server never
//! answers. Every length and count is a signed 32-bit integer.
//!
//! ```text
//! ┌──────────────┐
//! │ FileCount(4) │                               ClientHello
//! ├──────────────┼───────────┬──────────────┬─────────────┐
//! │ NameLen (4)  │   Name    │ ContentLen(4)│   Content   │  FileUnit × FileCount
//! └──────────────┴───────────┴──────────────┴─────────────┘
//! ```
//!
//! A zero-length blob is a 4-byte zero with no payload.

mod address;
mod codec;
mod unit;

pub use address::{bracket_host, join_host_port};
pub use codec::{
    receive_bytes, receive_int, send_bytes, send_bytes_chunked, send_int, INT_SIZE,
    TRANSFER_BUFFER_SIZE,
};
pub use unit::FileUnit;
