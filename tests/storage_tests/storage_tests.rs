//! Tests for StorageDir
//!
//! These tests verify:
//! - Directory creation on open
//! - Writing File Units
//! - Rejection of names that escape the directory

use std::fs;

use filerelay::protocol::FileUnit;
use filerelay::storage::StorageDir;
use tempfile::TempDir;

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_ensure_creates_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("incoming").join("nested");

    let storage = StorageDir::ensure(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(storage.path(), root.as_path());
}

#[test]
fn test_ensure_accepts_existing_directory() {
    let temp_dir = TempDir::new().unwrap();
    assert!(StorageDir::ensure(temp_dir.path()).is_ok());
}

#[test]
fn test_ensure_rejects_regular_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("not_a_dir");
    fs::write(&file, b"x").unwrap();

    let err = StorageDir::ensure(&file).unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_write_file() {
    let temp_dir = TempDir::new().unwrap();
    let storage = StorageDir::ensure(temp_dir.path()).unwrap();

    let path = storage
        .write_file(&FileUnit::new(&b"a.txt"[..], &b"hi"[..]))
        .unwrap();

    assert_eq!(path, temp_dir.path().join("a.txt"));
    assert_eq!(fs::read(&path).unwrap(), b"hi");
}

#[test]
fn test_write_empty_file() {
    let temp_dir = TempDir::new().unwrap();
    let storage = StorageDir::ensure(temp_dir.path()).unwrap();

    let path = storage
        .write_file(&FileUnit::new(&b"empty"[..], Vec::<u8>::new()))
        .unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}

#[test]
fn test_write_overwrites_existing() {
    let temp_dir = TempDir::new().unwrap();
    let storage = StorageDir::ensure(temp_dir.path()).unwrap();

    storage
        .write_file(&FileUnit::new(&b"f"[..], &b"first version"[..]))
        .unwrap();
    let path = storage
        .write_file(&FileUnit::new(&b"f"[..], &b"second"[..]))
        .unwrap();

    assert_eq!(fs::read(path).unwrap(), b"second");
}

// =============================================================================
// Name Validation Tests
// =============================================================================

#[test]
fn test_valid_names() {
    for name in ["a.txt", "report.final.pdf", ".hidden", "with space"] {
        assert!(StorageDir::validate_name(name).is_ok(), "{name}");
    }
}

#[test]
fn test_invalid_names() {
    for name in ["", ".", "..", "../escape", "sub/file", "/etc/passwd", "..\\win"] {
        assert!(StorageDir::validate_name(name).is_err(), "{name}");
    }
}

#[test]
fn test_traversal_is_not_written() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("store");
    let storage = StorageDir::ensure(&root).unwrap();

    let result = storage.write_file(&FileUnit::new(&b"../outside.txt"[..], &b"x"[..]));

    assert!(result.is_err());
    assert!(!temp_dir.path().join("outside.txt").exists());
}
