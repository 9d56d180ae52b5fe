//! Storage Module
//!
//! Where received files end up.
//!
//! ## Responsibilities
//! - Create the storage directory at server start
//! - Reject names that would escape the directory
//! - Write each File Unit as `storage_dir/<name>`
//!
//! ## Layout
//! ```text
//! {storage_dir}/
//!   ├── a.txt
//!   └── b.bin
//! ```

mod directory;

pub use directory::StorageDir;
