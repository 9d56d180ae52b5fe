//! File Unit definition
//!
//! One (name, content) pair as it travels on the wire.

use bytes::Bytes;

/// A single transferred file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUnit {
    /// Name blob; opaque bytes until the receiver builds a path from it
    pub name: Bytes,

    /// Content blob
    pub content: Bytes,
}

impl FileUnit {
    /// Create a file unit from its two blobs
    pub fn new(name: impl Into<Bytes>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Name interpreted as text (invalid UTF-8 is replaced)
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}
