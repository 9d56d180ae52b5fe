//! Client Module
//!
//! Sends a batch of files over one connection.
//!
//! ## Error Policy
//! - Fatal (validation, connect, any failed send): the batch aborts and
//!   the connection is closed
//! - Per-file (open or read failure): the file is logged and skipped,
//!   the batch continues
//!
//! The file count goes out before any file is opened. A skipped file
//! therefore leaves the server expecting one more File Unit than it will
//! get; it sees the connection close and reports a client disconnect.
//! `Config::verify_before_send` drops unopenable paths before the count
//! is sent.

mod request;
mod state;
mod transfer;

pub use request::{TransferRequest, MIN_CLIENT_ARGS};
pub use state::{ClientState, Step};
pub use transfer::{Client, SkippedFile, TransferReport};
