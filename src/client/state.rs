//! Client state machine
//!
//! States and the pure transition function. The driver in `transfer.rs`
//! performs the side effect of a state, reports a `Step`, and asks the
//! state for its successor.
//!
//! ```text
//! ValidateArgs → ParseAddress → Connect → SendFileCount
//!                                              │
//!        ┌─────────────────────────────────────┘
//!        ▼
//!    OpenFile → SendFileName → SendFileContent → AdvanceFile ─┬─▶ OpenFile
//!        │            │               │              ▲        └─▶ Terminate
//!        └────────────┴───────────────┴─▶ HandlePerFileError
//!
//! any fatal step → HandleFatalError → Terminate
//! ```

/// Client states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    ValidateArgs,
    ParseAddress,
    Connect,
    SendFileCount,
    OpenFile,
    SendFileName,
    SendFileContent,
    AdvanceFile,
    HandlePerFileError,
    HandleFatalError,
    Terminate,
}

/// Result of performing one state's side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The state's work succeeded
    Done,

    /// The current file failed; the batch continues without it
    FileFailed,

    /// The batch cannot continue
    Fatal,
}

impl ClientState {
    /// Initial state of every run
    pub const START: ClientState = ClientState::ValidateArgs;

    /// Compute the next state
    ///
    /// `cursor` is the index of the current file after the step ran and
    /// `total` the size of the batch.
    pub fn next(self, step: Step, cursor: usize, total: usize) -> ClientState {
        use ClientState::*;

        if step == Step::Fatal {
            return match self {
                HandleFatalError | Terminate => Terminate,
                _ => HandleFatalError,
            };
        }

        match (self, step) {
            (ValidateArgs, Step::Done) => ParseAddress,
            (ParseAddress, Step::Done) => Connect,
            (Connect, Step::Done) => SendFileCount,
            (SendFileCount, Step::Done) if total == 0 => Terminate,
            (SendFileCount, Step::Done) => OpenFile,
            (OpenFile, Step::Done) => SendFileName,
            (SendFileName, Step::Done) => SendFileContent,
            (SendFileContent, Step::Done) => AdvanceFile,
            (OpenFile | SendFileName | SendFileContent, Step::FileFailed) => HandlePerFileError,
            (HandlePerFileError, _) => AdvanceFile,
            (AdvanceFile, _) if cursor >= total => Terminate,
            (AdvanceFile, _) => OpenFile,
            (HandleFatalError, _) => Terminate,
            (Terminate, _) => Terminate,
            // Setup states have no per-file failure mode
            (ValidateArgs | ParseAddress | Connect | SendFileCount, Step::FileFailed) => {
                HandleFatalError
            }
            (_, Step::Fatal) => HandleFatalError,
        }
    }

    /// True once the machine has nothing left to do
    pub fn is_terminal(self) -> bool {
        self == ClientState::Terminate
    }
}
