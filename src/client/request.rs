//! Transfer request
//!
//! Positional client arguments, validated.

use std::path::PathBuf;

use crate::error::{RelayError, Result};

/// Minimum positional inputs: host, port, one file
pub const MIN_CLIENT_ARGS: usize = 3;

/// What the client was asked to send, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub host: String,
    pub port: String,
    pub files: Vec<PathBuf>,
}

impl TransferRequest {
    /// Validate `<host> <port> <file1> [file2 ...]`
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.len() < MIN_CLIENT_ARGS {
            return Err(RelayError::Config(
                "invalid number of arguments, <host> <port> <file1>...<fileN>".to_string(),
            ));
        }

        let host = args[0].clone();
        let port = args[1].clone();

        if host.is_empty() {
            return Err(RelayError::Config("host must not be empty".to_string()));
        }
        port.parse::<u16>()
            .map_err(|_| RelayError::Config(format!("invalid port: {:?}", port)))?;

        Ok(Self {
            host,
            port,
            files: args[2..].iter().map(PathBuf::from).collect(),
        })
    }
}
