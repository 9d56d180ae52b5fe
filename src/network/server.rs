//! TCP Server
//!
//! Owns the listening socket, accepts connections and runs one receive
//! session thread per connection until the shutdown token fires.

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::protocol::join_host_port;
use crate::storage::StorageDir;

use super::session::{Session, SessionReport};
use super::shutdown::ShutdownToken;

/// Exact positional inputs: host, port, storage directory
pub const SERVER_ARGS: usize = 3;

// =============================================================================
// Arguments
// =============================================================================

/// Validated server arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeRequest {
    pub host: String,
    pub port: String,
    pub storage_dir: PathBuf,
}

impl ServeRequest {
    /// Validate `<host> <port> <storageDir>`
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.len() != SERVER_ARGS {
            return Err(RelayError::Config(
                "invalid number of arguments, <host> <port> <storage directory>".to_string(),
            ));
        }

        let port = args[1].clone();
        port.parse::<u16>()
            .map_err(|_| RelayError::Config(format!("invalid port: {:?}", port)))?;

        Ok(Self {
            host: args[0].clone(),
            port,
            storage_dir: PathBuf::from(&args[2]),
        })
    }
}

// =============================================================================
// State Machine
// =============================================================================

/// Server states
///
/// ```text
/// Initialize → ValidateArgs → ParseAddress → EnsureStorageDir → Bind → AcceptLoop ⟲
///     │             │                              │             │        │
///     └─────────────┴──────────────▶ FatalError ◀──┴─────────────┘        ▼
///                                        └──────────────────────────▶ Terminate
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Initialize,
    ValidateArgs,
    ParseAddress,
    EnsureStorageDir,
    Bind,
    AcceptLoop,
    Terminate,
    FatalError,
}

/// Result of performing one server state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStep {
    Done,

    /// The listener is closed or shutdown was requested
    Closed,

    Fatal,
}

impl ServerState {
    /// Compute the next state
    pub fn next(self, step: ServerStep) -> ServerState {
        use ServerState::*;

        match (self, step) {
            (Terminate, _) | (FatalError, _) => Terminate,
            (_, ServerStep::Fatal) => FatalError,
            (AcceptLoop, ServerStep::Closed) => Terminate,
            (AcceptLoop, ServerStep::Done) => AcceptLoop,
            (Initialize, _) => ValidateArgs,
            (ValidateArgs, _) => ParseAddress,
            (ParseAddress, _) => EnsureStorageDir,
            (EnsureStorageDir, _) => Bind,
            (Bind, _) => AcceptLoop,
        }
    }
}

/// What the accept loop should do with an accept error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptAction {
    /// Nothing pending; sleep, then observe the shutdown token again
    Idle,

    /// Transient failure; log it and retry after one poll interval
    Retry,

    /// The listener is gone
    Stop,
}

impl AcceptAction {
    /// True if the loop should sleep one poll interval before the next attempt
    pub fn backs_off(self) -> bool {
        matches!(self, AcceptAction::Idle | AcceptAction::Retry)
    }
}

/// Classify an error returned by `accept`
pub fn classify_accept_error(error: &io::Error) -> AcceptAction {
    match error.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => AcceptAction::Idle,
        ErrorKind::NotConnected | ErrorKind::InvalidInput => AcceptAction::Stop,
        _ => AcceptAction::Retry,
    }
}

/// How the server stopped
#[derive(Debug)]
pub enum ServerExit {
    /// Shutdown was requested and the listener closed
    Shutdown,

    /// Startup failed
    Fatal(RelayError),
}

// =============================================================================
// Server
// =============================================================================

/// TCP server for filerelay
pub struct Server {
    config: Config,
    args: Vec<String>,
    shutdown: ShutdownToken,

    request: Option<ServeRequest>,
    address: String,
    storage: Option<StorageDir>,
    listener: Option<TcpListener>,

    /// Spawned session threads, reaped as they finish
    sessions: Vec<JoinHandle<()>>,
    next_session_id: u64,

    /// Receives the report of every finished session, if set
    session_tx: Option<Sender<SessionReport>>,

    /// Receives the bound address once listening
    listening_tx: Option<Sender<SocketAddr>>,

    last_error: Option<RelayError>,
}

impl Server {
    /// Create a server for the positional arguments `<host> <port> <storageDir>`
    pub fn new(args: Vec<String>, config: Config, shutdown: ShutdownToken) -> Self {
        Self {
            config,
            args,
            shutdown,
            request: None,
            address: String::new(),
            storage: None,
            listener: None,
            sessions: Vec::new(),
            next_session_id: 0,
            session_tx: None,
            listening_tx: None,
            last_error: None,
        }
    }

    /// Send the bound address on `tx` once the server is listening
    pub fn with_listening_notifier(mut self, tx: Sender<SocketAddr>) -> Self {
        self.listening_tx = Some(tx);
        self
    }

    /// Send each finished session's report on `tx`
    ///
    /// Reports are not retained by the server itself.
    pub fn with_session_observer(mut self, tx: Sender<SessionReport>) -> Self {
        self.session_tx = Some(tx);
        self
    }

    /// Start the server (blocking until shutdown or a fatal error)
    ///
    /// Returns only after every spawned session has finished.
    pub fn run(&mut self) -> ServerExit {
        let mut state = ServerState::Initialize;

        loop {
            tracing::trace!("Server state: {:?}", state);
            let step = match state {
                ServerState::Initialize => self.step(Self::initialize),
                ServerState::ValidateArgs => self.step(Self::validate_args),
                ServerState::ParseAddress => self.step(Self::parse_address),
                ServerState::EnsureStorageDir => self.step(Self::ensure_storage_dir),
                ServerState::Bind => self.step(Self::bind),
                ServerState::AcceptLoop => self.accept_once(),
                ServerState::FatalError => {
                    if let Some(e) = &self.last_error {
                        tracing::error!("Fatal Error: {}", e);
                    }
                    ServerStep::Done
                }
                ServerState::Terminate => {
                    self.terminate();
                    break;
                }
            };
            state = state.next(step);
        }

        match self.last_error.take() {
            Some(e) => ServerExit::Fatal(e),
            None => ServerExit::Shutdown,
        }
    }

    fn step(&mut self, f: fn(&mut Self) -> Result<()>) -> ServerStep {
        match f(self) {
            Ok(()) => ServerStep::Done,
            Err(e) => {
                self.last_error = Some(e);
                ServerStep::Fatal
            }
        }
    }

    // -------------------------------------------------------------------------
    // Startup states
    // -------------------------------------------------------------------------

    fn initialize(&mut self) -> Result<()> {
        if self.config.install_signal_handler {
            self.shutdown.install_ctrlc_handler()?;
        }
        Ok(())
    }

    fn validate_args(&mut self) -> Result<()> {
        self.request = Some(ServeRequest::from_args(&self.args)?);
        Ok(())
    }

    fn parse_address(&mut self) -> Result<()> {
        let request = self.request()?;
        self.address = join_host_port(&request.host, &request.port);
        Ok(())
    }

    fn ensure_storage_dir(&mut self) -> Result<()> {
        let dir = self.request()?.storage_dir.clone();
        self.storage = Some(StorageDir::ensure(dir)?);
        Ok(())
    }

    fn bind(&mut self) -> Result<()> {
        let listener = TcpListener::bind(&self.address).map_err(|e| {
            RelayError::Network(format!("failed to listen on {}: {}", self.address, e))
        })?;

        // Non-blocking so the loop can observe the shutdown token while idle
        listener.set_nonblocking(true)?;
        let local = listener.local_addr()?;

        tracing::info!("Server listening on {}", local);
        if let Some(tx) = self.listening_tx.take() {
            let _ = tx.send(local);
        }

        self.listener = Some(listener);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accept loop
    // -------------------------------------------------------------------------

    /// One accept attempt
    fn accept_once(&mut self) -> ServerStep {
        self.reap_sessions();

        if self.shutdown.is_triggered() {
            return ServerStep::Closed;
        }

        let Some(listener) = self.listener.as_ref() else {
            tracing::info!("Server closed connection");
            return ServerStep::Closed;
        };

        match listener.accept() {
            Ok((stream, peer)) => {
                // A shutdown may have raced this accept
                if self.shutdown.is_triggered() {
                    tracing::debug!("Shutdown requested, dropping connection from {}", peer);
                    return ServerStep::Closed;
                }
                self.dispatch(stream, peer);
                ServerStep::Done
            }
            Err(e) => {
                let action = classify_accept_error(&e);
                if action == AcceptAction::Retry {
                    tracing::warn!("Accept failed: {}", e);
                }
                if action.backs_off() {
                    // Persistent errors such as EMFILE repeat on every attempt
                    thread::sleep(Duration::from_millis(self.config.accept_poll_interval_ms));
                }

                if action == AcceptAction::Stop {
                    tracing::info!("Server closed connection");
                    ServerStep::Closed
                } else {
                    ServerStep::Done
                }
            }
        }
    }

    /// Spawn a receive session for an accepted connection
    fn dispatch(&mut self, stream: TcpStream, peer: SocketAddr) {
        let Some(storage) = self.storage.clone() else {
            tracing::warn!("No storage directory, dropping connection from {}", peer);
            return;
        };

        // Accepted sockets may inherit the listener's non-blocking mode
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Failed to configure connection from {}: {}", peer, e);
            return;
        }

        let config = self.config.clone();
        let session_tx = self.session_tx.clone();
        let id = self.next_session_id;
        self.next_session_id += 1;

        let spawned = thread::Builder::new()
            .name(format!("session-{}", id))
            .spawn(move || match Session::from_stream(stream, storage, &config) {
                Ok(session) => {
                    let report = session.run();
                    if let Some(tx) = session_tx {
                        let _ = tx.send(report);
                    }
                }
                Err(e) => tracing::warn!("Failed to start session for {}: {}", peer, e),
            });

        match spawned {
            Ok(handle) => self.sessions.push(handle),
            Err(e) => tracing::warn!("Failed to spawn session for {}: {}", peer, e),
        }
    }

    /// Join session threads that have already finished
    fn reap_sessions(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) = self
            .sessions
            .drain(..)
            .partition(|handle| handle.is_finished());

        for handle in finished {
            if handle.join().is_err() {
                tracing::warn!("Session thread panicked");
            }
        }
        self.sessions = running;
    }

    // -------------------------------------------------------------------------
    // Terminate
    // -------------------------------------------------------------------------

    /// Close the listener and wait for in-flight sessions
    fn terminate(&mut self) {
        self.listener = None;

        if !self.sessions.is_empty() {
            tracing::info!(
                "Waiting for {} in-flight connection(s) to finish",
                self.sessions.len()
            );
        }
        for handle in self.sessions.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Session thread panicked");
            }
        }

        tracing::info!("Server exiting...");
    }

    fn request(&self) -> Result<&ServeRequest> {
        self.request
            .as_ref()
            .ok_or_else(|| RelayError::Config("arguments were not validated".to_string()))
    }
}
