//! Framing codec
//!
//! Length-prefixed integers and blobs over any byte stream.
//!
//! ## Wire Format
//!
//! ### Integer
//! ```text
//! ┌──────────────────────┐
//! │ i32 big-endian (4)   │
//! └──────────────────────┘
//! ```
//!
//! ### Blob
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │         Payload             │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! The sender splits the payload into chunks of at most
//! `TRANSFER_BUFFER_SIZE` bytes, flushing after each one. The receiver
//! ignores chunk boundaries and rebuilds the blob as one unit.

use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use crate::error::{RelayError, Result};

/// Size of an encoded integer on the wire
pub const INT_SIZE: usize = 4;

/// Largest single write / read issued for a blob payload (1 MiB)
pub const TRANSFER_BUFFER_SIZE: usize = 1024 * 1024;

// =============================================================================
// Integers
// =============================================================================

/// Write `n` as 4 big-endian bytes and flush
pub fn send_int<W: Write>(writer: &mut W, n: i32) -> Result<()> {
    writer.write_all(&n.to_be_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read exactly 4 bytes and decode them as a big-endian i32
///
/// A stream that ends early yields an `UnexpectedEof` I/O error.
pub fn receive_int<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; INT_SIZE];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

// =============================================================================
// Blobs
// =============================================================================

/// Send a length-prefixed blob using the default chunk size
///
/// Returns the number of payload bytes sent.
pub fn send_bytes<W: Write>(writer: &mut W, data: &[u8]) -> Result<usize> {
    send_bytes_chunked(writer, data, TRANSFER_BUFFER_SIZE)
}

/// Send a length-prefixed blob, writing at most `chunk_size` bytes per write
pub fn send_bytes_chunked<W: Write>(writer: &mut W, data: &[u8], chunk_size: usize) -> Result<usize> {
    let len = i32::try_from(data.len()).map_err(|_| {
        RelayError::Protocol(format!(
            "Blob too large: {} bytes (max {})",
            data.len(),
            i32::MAX
        ))
    })?;

    send_int(writer, len)?;

    for chunk in data.chunks(chunk_size.max(1)) {
        writer.write_all(chunk)?;
        writer.flush()?;
    }

    Ok(data.len())
}

/// Receive a length-prefixed blob
///
/// Loops until the declared number of bytes has been accumulated, since a
/// single read may return less than requested. The buffer grows one chunk
/// at a time so a bogus length cannot force a huge upfront allocation.
pub fn receive_bytes<R: Read>(reader: &mut R) -> Result<Bytes> {
    let size = receive_int(reader)?;
    if size < 0 {
        return Err(RelayError::Protocol(format!(
            "Negative blob length: {}",
            size
        )));
    }
    let size = size as usize;

    let mut data = BytesMut::with_capacity(size.min(TRANSFER_BUFFER_SIZE));
    let mut received = 0;

    while received < size {
        let read_size = (size - received).min(TRANSFER_BUFFER_SIZE);
        data.resize(received + read_size, 0);

        match reader.read(&mut data[received..received + read_size]) {
            Ok(0) => {
                return Err(RelayError::Io(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("stream closed after {} of {} bytes", received, size),
                )));
            }
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    data.truncate(received);
    Ok(data.freeze())
}
