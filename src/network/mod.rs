//! Network Module
//!
//! TCP server and per-connection handling.
//!
//! ## Architecture
//! - Single accept loop on the caller's thread
//! - One session thread per accepted connection (no pool, no limit)
//! - Shutdown token observed after every accept attempt; in-flight
//!   sessions are joined, never cancelled

mod server;
mod session;
mod shutdown;

pub use server::{
    classify_accept_error, AcceptAction, ServeRequest, Server, ServerExit, ServerState,
    ServerStep, SERVER_ARGS,
};
pub use session::{ReceiveState, Session, SessionOutcome, SessionReport};
pub use shutdown::ShutdownToken;
