//! Receive Session
//!
//! Handles one accepted connection from its file count to its last File
//! Unit. Any read or write failure ends the session; nothing is retried.

use std::io::{BufReader, Read};
use std::net::TcpStream;
use std::path::PathBuf;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::protocol::{receive_bytes, receive_int, FileUnit};
use crate::storage::StorageDir;

// =============================================================================
// State Machine
// =============================================================================

/// Receive states
///
/// ```text
/// ReadFileCount → ReadFileName → ReadFileContent → WriteFile → AdvanceFile ─┬─▶ ReadFileName
///       │               │               │              │                    └─▶ Exit
///       └───────────────┴───────────────┴──────────────┴─▶ HandleError ─▶ Exit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    ReadFileCount,
    ReadFileName,
    ReadFileContent,
    WriteFile,
    AdvanceFile,
    HandleError,
    Exit,
}

impl ReceiveState {
    /// Compute the next state
    ///
    /// `ok` is whether the state's side effect succeeded; `received` and
    /// `expected` are the session's file counters after it ran.
    pub fn next(self, ok: bool, received: usize, expected: usize) -> ReceiveState {
        use ReceiveState::*;

        match self {
            HandleError | Exit => Exit,
            _ if !ok => HandleError,
            ReadFileCount | AdvanceFile if received >= expected => Exit,
            ReadFileCount | AdvanceFile => ReadFileName,
            ReadFileName => ReadFileContent,
            ReadFileContent => WriteFile,
            WriteFile => AdvanceFile,
        }
    }
}

// =============================================================================
// Session Report
// =============================================================================

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every announced file was written
    Completed,

    /// The peer closed the stream before the batch was complete
    ClientClosed,

    /// A read, decode or write error ended the session
    Failed(String),
}

/// Summary of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub peer: String,

    /// Count announced by the client, once read
    pub declared_count: Option<usize>,

    /// Paths written, in arrival order
    pub files: Vec<PathBuf>,

    pub outcome: SessionOutcome,
}

// =============================================================================
// Session
// =============================================================================

/// Per-connection receive state
pub struct Session<R> {
    /// Stream reader (buffered for efficiency)
    reader: BufReader<R>,

    /// Where received files are written
    storage: StorageDir,

    /// Peer address for logging
    peer: String,

    expected: usize,
    received: usize,

    name: Option<Bytes>,
    content: Option<Bytes>,

    last_error: Option<RelayError>,
    report: SessionReport,
}

impl Session<TcpStream> {
    /// Create a session for an accepted TCP stream
    pub fn from_stream(stream: TcpStream, storage: StorageDir, config: &Config) -> Result<Self> {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(config.nodelay)?;

        Ok(Self::new(stream, storage, peer))
    }
}

impl<R: Read> Session<R> {
    /// Create a session over any byte stream
    pub fn new(stream: R, storage: StorageDir, peer: impl Into<String>) -> Self {
        let peer = peer.into();
        Self {
            reader: BufReader::new(stream),
            storage,
            peer: peer.clone(),
            expected: 0,
            received: 0,
            name: None,
            content: None,
            last_error: None,
            report: SessionReport {
                peer,
                declared_count: None,
                files: Vec::new(),
                outcome: SessionOutcome::Completed,
            },
        }
    }

    /// Run the session until Exit, then close the stream
    pub fn run(mut self) -> SessionReport {
        tracing::debug!("Connection established from {}", self.peer);

        let mut state = ReceiveState::ReadFileCount;
        while state != ReceiveState::Exit {
            tracing::trace!("Session {} state: {:?}", self.peer, state);
            let ok = self.execute(state);
            state = state.next(ok, self.received, self.expected);
        }

        tracing::debug!("Closing connection from {}", self.peer);
        self.report
    }

    /// Perform the side effect of one state
    fn execute(&mut self, state: ReceiveState) -> bool {
        let result = match state {
            ReceiveState::ReadFileCount => self.read_file_count(),
            ReceiveState::ReadFileName => {
                receive_bytes(&mut self.reader).map(|name| self.name = Some(name))
            }
            ReceiveState::ReadFileContent => {
                receive_bytes(&mut self.reader).map(|content| self.content = Some(content))
            }
            ReceiveState::WriteFile => self.write_file(),
            ReceiveState::AdvanceFile | ReceiveState::Exit => Ok(()),
            ReceiveState::HandleError => {
                self.handle_error();
                Ok(())
            }
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                self.last_error = Some(e);
                false
            }
        }
    }

    fn read_file_count(&mut self) -> Result<()> {
        let count = receive_int(&mut self.reader)?;
        let count = usize::try_from(count)
            .map_err(|_| RelayError::Protocol(format!("Negative file count: {}", count)))?;

        tracing::debug!("Client {} announced {} file(s)", self.peer, count);
        self.expected = count;
        self.report.declared_count = Some(count);
        Ok(())
    }

    fn write_file(&mut self) -> Result<()> {
        let unit = FileUnit::new(
            self.name.take().unwrap_or_default(),
            self.content.take().unwrap_or_default(),
        );

        let path = self.storage.write_file(&unit)?;
        tracing::info!(
            "created file {} in {}",
            unit.name_lossy(),
            self.storage.path().display()
        );

        self.report.files.push(path);
        self.received += 1;
        Ok(())
    }

    fn handle_error(&mut self) {
        let Some(error) = self.last_error.take() else {
            return;
        };

        if error.is_eof() {
            tracing::warn!("Error: Client {} closed connection", self.peer);
            self.report.outcome = SessionOutcome::ClientClosed;
        } else {
            tracing::warn!("Error: {} ({})", error, self.peer);
            self.report.outcome = SessionOutcome::Failed(error.to_string());
        }
    }
}
