//! # filerelay
//!
//! A minimal point-to-point file transfer utility:
//! - A client announces a batch of files and streams each name and body
//! - A server persists every received file into a storage directory
//! - One thread per accepted connection, graceful shutdown on Ctrl+C
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐                    ┌──────────────────────┐
//! │   Client Machine     │                    │     Accept Loop      │
//! │ (sequential batch)   │                    │ (ShutdownToken)      │
//! └──────────┬───────────┘                    └──────────┬───────────┘
//!            │                                           │ spawn
//!            ▼                                           ▼
//!   ┌─────────────────┐        TCP stream       ┌─────────────────┐
//!   │  Framing Codec  │ ──────────────────────▶ │  Framing Codec  │
//!   └─────────────────┘                         └────────┬────────┘
//!                                                        ▼
//!                                               ┌─────────────────┐
//!                                               │ Receive Session │
//!                                               └────────┬────────┘
//!                                                        ▼
//!                                               ┌─────────────────┐
//!                                               │  Storage Dir    │
//!                                               └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod storage;
pub mod client;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RelayError, Result};
pub use config::Config;
pub use client::{Client, TransferReport};
pub use network::{Server, ServerExit, ShutdownToken};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of filerelay
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
