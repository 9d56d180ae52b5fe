//! Shutdown Token
//!
//! Process-wide stop request shared between the signal watcher and the
//! accept loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{RelayError, Result};

/// Cloneable stop flag
///
/// Every clone observes the same flag. Once triggered it stays triggered.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    /// Create an untriggered token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Has shutdown been requested?
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Trigger this token when the process receives Ctrl+C / SIGINT
    ///
    /// The handler runs on a dedicated thread owned by `ctrlc`. Only one
    /// handler may be installed per process.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Received Ctrl+C, initiating shutdown...");
            token.trigger();
        })
        .map_err(|e| RelayError::Signal(e.to_string()))
    }
}
