//! Storage Directory
//!
//! Persists received files under a single root directory.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{RelayError, Result};
use crate::protocol::FileUnit;

/// Destination directory for received files
///
/// Cheap to clone; every session gets its own copy.
#[derive(Debug, Clone)]
pub struct StorageDir {
    /// Root all received files are written under
    root: PathBuf,
}

impl StorageDir {
    /// Open the storage directory, creating it if absent
    ///
    /// Fails if the path exists but is not a directory.
    pub fn ensure(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();

        if root.exists() {
            if !root.is_dir() {
                return Err(RelayError::Storage(format!(
                    "{} exists and is not a directory",
                    root.display()
                )));
            }
        } else {
            fs::create_dir_all(&root)?;
            tracing::debug!("Created storage directory {}", root.display());
        }

        Ok(Self { root })
    }

    /// Root directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Check that a received name stays inside the storage directory
    ///
    /// Accepts exactly one normal path component: no separators, no
    /// `.`/`..`, no absolute or prefixed paths, not empty.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(RelayError::InvalidFileName("empty name".to_string()));
        }
        if name.contains('/') || name.contains('\\') || name.contains('\0') {
            return Err(RelayError::InvalidFileName(format!(
                "{:?} contains a path separator",
                name
            )));
        }

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(RelayError::InvalidFileName(format!(
                "{:?} does not name a file",
                name
            ))),
        }
    }

    /// Create `root/<name>` (truncating any existing file) and write the content
    ///
    /// Returns the path that was written.
    pub fn write_file(&self, unit: &FileUnit) -> Result<PathBuf> {
        let name = unit.name_lossy();
        Self::validate_name(&name)?;

        let path = self.root.join(&name);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        file.write_all(&unit.content)?;
        file.flush()?;

        Ok(path)
    }
}
