//! Client transfer driver
//!
//! Runs one outbound connection through the client state machine.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::protocol::{join_host_port, send_bytes_chunked, send_int};

use super::request::TransferRequest;
use super::state::{ClientState, Step};

/// A file that was left out of the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one client run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// File count announced to the server, if it was sent
    pub declared_count: Option<usize>,

    /// Base names of files fully sent, in wire order
    pub sent: Vec<String>,

    /// Files skipped because of a per-file error
    pub skipped: Vec<SkippedFile>,

    /// Error that aborted the batch
    pub fatal: Option<String>,
}

impl TransferReport {
    /// True if the batch was not aborted by a fatal error
    pub fn completed(&self) -> bool {
        self.fatal.is_none()
    }
}

/// Client side of a transfer
pub struct Client {
    config: Config,
    args: Vec<String>,

    request: Option<TransferRequest>,
    address: String,
    writer: Option<BufWriter<TcpStream>>,

    /// File opened by OpenFile, consumed by SendFileContent
    file: Option<File>,
    cursor: usize,
    last_error: Option<RelayError>,

    report: TransferReport,
}

impl Client {
    /// Create a client for the positional arguments `<host> <port> <file>...`
    pub fn new(args: Vec<String>, config: Config) -> Self {
        Self {
            config,
            args,
            request: None,
            address: String::new(),
            writer: None,
            file: None,
            cursor: 0,
            last_error: None,
            report: TransferReport::default(),
        }
    }

    /// Drive the state machine to Terminate
    pub fn run(mut self) -> TransferReport {
        let mut state = ClientState::START;

        loop {
            tracing::trace!("Client state: {:?}", state);
            let step = self.execute(state);
            if state.is_terminal() {
                break;
            }
            state = state.next(step, self.cursor, self.batch_len());
        }

        self.report
    }

    /// Perform the side effect of one state
    fn execute(&mut self, state: ClientState) -> Step {
        let result = match state {
            ClientState::ValidateArgs => self.validate_args(),
            ClientState::ParseAddress => self.parse_address(),
            ClientState::Connect => self.connect(),
            ClientState::SendFileCount => self.send_file_count(),
            ClientState::OpenFile => return self.open_file(),
            ClientState::SendFileName => return self.send_file_name(),
            ClientState::SendFileContent => return self.send_file_content(),
            ClientState::AdvanceFile => {
                self.cursor += 1;
                Ok(())
            }
            ClientState::HandlePerFileError => {
                self.handle_per_file_error();
                Ok(())
            }
            ClientState::HandleFatalError => {
                self.handle_fatal_error();
                Ok(())
            }
            ClientState::Terminate => {
                self.terminate();
                Ok(())
            }
        };

        match result {
            Ok(()) => Step::Done,
            Err(e) => {
                self.last_error = Some(e);
                Step::Fatal
            }
        }
    }

    // -------------------------------------------------------------------------
    // Setup states
    // -------------------------------------------------------------------------

    fn validate_args(&mut self) -> Result<()> {
        self.request = Some(TransferRequest::from_args(&self.args)?);
        Ok(())
    }

    fn parse_address(&mut self) -> Result<()> {
        let request = self.request()?;
        self.address = join_host_port(&request.host, &request.port);
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        let stream = TcpStream::connect(&self.address).map_err(|e| {
            RelayError::Network(format!("failed to connect to {}: {}", self.address, e))
        })?;
        stream.set_nodelay(self.config.nodelay)?;

        tracing::debug!("Connected to {}", self.address);
        self.writer = Some(BufWriter::new(stream));
        Ok(())
    }

    fn send_file_count(&mut self) -> Result<()> {
        if self.config.verify_before_send {
            self.drop_unreadable_files();
        }

        let count = self.batch_len();
        let wire_count = i32::try_from(count)
            .map_err(|_| RelayError::Protocol(format!("too many files: {}", count)))?;

        send_int(self.writer()?, wire_count)?;
        self.report.declared_count = Some(count);
        self.cursor = 0;
        Ok(())
    }

    /// Remove paths that cannot be opened, so the announced count is honest
    fn drop_unreadable_files(&mut self) {
        let Some(request) = self.request.as_mut() else {
            return;
        };

        let skipped = &mut self.report.skipped;
        request.files.retain(|path| match File::open(path) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Error: {}: {}", path.display(), e);
                skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                false
            }
        });
    }

    // -------------------------------------------------------------------------
    // Per-file states
    // -------------------------------------------------------------------------

    fn open_file(&mut self) -> Step {
        let path = match self.current_path() {
            Ok(path) => path,
            Err(e) => return self.fail_fatal(e),
        };

        match File::open(&path) {
            Ok(file) => {
                self.file = Some(file);
                Step::Done
            }
            Err(e) => self.fail_file(e.into()),
        }
    }

    fn send_file_name(&mut self) -> Step {
        let path = match self.current_path() {
            Ok(path) => path,
            Err(e) => return self.fail_fatal(e),
        };

        let Some(name) = base_name(&path) else {
            self.file = None;
            return self.fail_file(RelayError::InvalidFileName(format!(
                "{} has no file name",
                path.display()
            )));
        };

        let chunk_size = self.config.transfer_buffer_size;
        let sent = self
            .writer()
            .and_then(|w| send_bytes_chunked(w, name.as_bytes(), chunk_size));

        match sent {
            Ok(_) => Step::Done,
            Err(e) => {
                self.file = None;
                self.fail_fatal(e)
            }
        }
    }

    fn send_file_content(&mut self) -> Step {
        let path = match self.current_path() {
            Ok(path) => path,
            Err(e) => return self.fail_fatal(e),
        };

        let mut content = Vec::new();
        let read = match self.file.take() {
            Some(mut file) => file.read_to_end(&mut content).map_err(RelayError::from),
            None => Err(RelayError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "file was not opened",
            ))),
        };
        if let Err(e) = read {
            return self.fail_file(e);
        }

        let chunk_size = self.config.transfer_buffer_size;
        let sent = self
            .writer()
            .and_then(|w| send_bytes_chunked(w, &content, chunk_size));

        match sent {
            Ok(_) => {
                let name = base_name(&path).unwrap_or_else(|| path.display().to_string());
                tracing::info!("Sent file {}", name);
                self.report.sent.push(name);
                Step::Done
            }
            Err(e) => self.fail_fatal(e),
        }
    }

    // -------------------------------------------------------------------------
    // Error and terminal states
    // -------------------------------------------------------------------------

    fn handle_per_file_error(&mut self) {
        let reason = self
            .last_error
            .take()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        let path = self.current_path().unwrap_or_default();

        tracing::warn!("Error: {}: {}", path.display(), reason);
        self.report.skipped.push(SkippedFile { path, reason });
    }

    fn handle_fatal_error(&mut self) {
        let reason = self
            .last_error
            .take()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());

        tracing::error!("Fatal Error: {}", reason);
        self.report.fatal = Some(reason);
    }

    fn terminate(&mut self) {
        self.file = None;
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::debug!("Flush on close failed: {}", e);
            }
        }
        tracing::info!("Client exiting...");
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn fail_file(&mut self, error: RelayError) -> Step {
        self.last_error = Some(error);
        Step::FileFailed
    }

    fn fail_fatal(&mut self, error: RelayError) -> Step {
        self.last_error = Some(error);
        Step::Fatal
    }

    fn request(&self) -> Result<&TransferRequest> {
        self.request
            .as_ref()
            .ok_or_else(|| RelayError::Config("arguments were not validated".to_string()))
    }

    fn writer(&mut self) -> Result<&mut BufWriter<TcpStream>> {
        self.writer
            .as_mut()
            .ok_or_else(|| RelayError::Network("not connected".to_string()))
    }

    fn current_path(&self) -> Result<PathBuf> {
        self.request()?
            .files
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| RelayError::Config(format!("no file at index {}", self.cursor)))
    }

    fn batch_len(&self) -> usize {
        self.request.as_ref().map_or(0, |r| r.files.len())
    }
}

/// Final path component, as sent on the wire
fn base_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
