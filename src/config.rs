//! Configuration for filerelay
//!
//! Centralized configuration with sensible defaults. Host, port, file list
//! and storage directory are not part of it: they arrive as positional
//! arguments and are validated by each state machine.

use crate::protocol::TRANSFER_BUFFER_SIZE;

/// Tunables shared by the client and the server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Transfer Configuration
    // -------------------------------------------------------------------------
    /// Largest single write issued while sending a blob (bytes)
    pub transfer_buffer_size: usize,

    /// Disable Nagle's algorithm on every stream
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Client Configuration
    // -------------------------------------------------------------------------
    /// Drop unreadable paths before the file count is sent
    pub verify_before_send: bool,

    // -------------------------------------------------------------------------
    // Server Configuration
    // -------------------------------------------------------------------------
    /// How long the idle accept loop sleeps between shutdown checks (milliseconds)
    pub accept_poll_interval_ms: u64,

    /// Install a Ctrl+C handler that triggers the server's shutdown token
    pub install_signal_handler: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transfer_buffer_size: TRANSFER_BUFFER_SIZE, // 1 MiB
            nodelay: true,
            verify_before_send: false,
            accept_poll_interval_ms: 50,
            install_signal_handler: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the chunk size used when sending blobs (clamped to at least 1 byte)
    pub fn transfer_buffer_size(mut self, size: usize) -> Self {
        self.config.transfer_buffer_size = size.max(1);
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.config.nodelay = enabled;
        self
    }

    /// Drop unreadable files before announcing the batch size
    pub fn verify_before_send(mut self, enabled: bool) -> Self {
        self.config.verify_before_send = enabled;
        self
    }

    /// Set the idle accept poll interval (in milliseconds)
    pub fn accept_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_interval_ms = ms;
        self
    }

    /// Install the Ctrl+C handler when the server initializes
    pub fn install_signal_handler(mut self, enabled: bool) -> Self {
        self.config.install_signal_handler = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
