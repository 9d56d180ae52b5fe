//! Tests for the receive Session
//!
//! These tests verify:
//! - Pure receive state transitions
//! - Complete batches are written and end the session
//! - EOF before the declared count is reported as a client disconnect
//! - Decode and write failures end the session with a generic error

use std::fs;
use std::io::Cursor;

use filerelay::network::{ReceiveState, Session, SessionOutcome};
use filerelay::protocol::{send_bytes, send_int};
use filerelay::storage::StorageDir;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_storage() -> (TempDir, StorageDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage = StorageDir::ensure(temp_dir.path()).unwrap();
    (temp_dir, storage)
}

/// Encode a ClientHello followed by the given File Units
fn encode_batch(count: i32, units: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Vec::new();
    send_int(&mut buffer, count).unwrap();
    for (name, content) in units {
        send_bytes(&mut buffer, name.as_bytes()).unwrap();
        send_bytes(&mut buffer, content).unwrap();
    }
    buffer
}

fn run_session(storage: &StorageDir, bytes: Vec<u8>) -> filerelay::network::SessionReport {
    Session::new(Cursor::new(bytes), storage.clone(), "test-peer").run()
}

// =============================================================================
// State Transition Tests
// =============================================================================

#[test]
fn test_receive_happy_path_transitions() {
    use ReceiveState::*;

    assert_eq!(ReadFileCount.next(true, 0, 2), ReadFileName);
    assert_eq!(ReadFileName.next(true, 0, 2), ReadFileContent);
    assert_eq!(ReadFileContent.next(true, 0, 2), WriteFile);
    assert_eq!(WriteFile.next(true, 1, 2), AdvanceFile);
    assert_eq!(AdvanceFile.next(true, 1, 2), ReadFileName);
    assert_eq!(AdvanceFile.next(true, 2, 2), Exit);
}

#[test]
fn test_receive_zero_count_exits() {
    assert_eq!(ReceiveState::ReadFileCount.next(true, 0, 0), ReceiveState::Exit);
}

#[test]
fn test_receive_failures_route_to_handle_error() {
    use ReceiveState::*;

    for state in [ReadFileCount, ReadFileName, ReadFileContent, WriteFile] {
        assert_eq!(state.next(false, 0, 2), HandleError);
    }
    assert_eq!(HandleError.next(true, 0, 2), Exit);
    assert_eq!(Exit.next(true, 0, 2), Exit);
}

// =============================================================================
// Session Tests
// =============================================================================

#[test]
fn test_session_writes_full_batch() {
    let (temp, storage) = setup_storage();
    let bytes = encode_batch(2, &[("a.txt", &b"hi"[..]), ("b.bin", &[0u8, 1, 2][..])]);

    let report = run_session(&storage, bytes);

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.declared_count, Some(2));
    assert_eq!(report.files.len(), 2);
    assert_eq!(fs::read(temp.path().join("a.txt")).unwrap(), b"hi");
    assert_eq!(fs::read(temp.path().join("b.bin")).unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_session_stops_at_declared_count() {
    let (temp, storage) = setup_storage();
    // One extra unit beyond the declared count must be ignored
    let bytes = encode_batch(1, &[("first", &b"1"[..]), ("extra", &b"2"[..])]);

    let report = run_session(&storage, bytes);

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.files.len(), 1);
    assert!(temp.path().join("first").exists());
    assert!(!temp.path().join("extra").exists());
}

#[test]
fn test_session_empty_content() {
    let (temp, storage) = setup_storage();
    let bytes = encode_batch(1, &[("empty", &b""[..])]);

    let report = run_session(&storage, bytes);

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(fs::metadata(temp.path().join("empty")).unwrap().len(), 0);
}

#[test]
fn test_session_zero_files() {
    let (_temp, storage) = setup_storage();
    let report = run_session(&storage, encode_batch(0, &[]));

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert!(report.files.is_empty());
}

#[test]
fn test_session_eof_before_count_is_client_closed() {
    let (temp, storage) = setup_storage();
    // Announces two files, delivers one, then the stream ends
    let bytes = encode_batch(2, &[("a.txt", &b"hi"[..])]);

    let report = run_session(&storage, bytes);

    assert_eq!(report.outcome, SessionOutcome::ClientClosed);
    assert_eq!(report.files.len(), 1);
    assert_eq!(fs::read(temp.path().join("a.txt")).unwrap(), b"hi");
}

#[test]
fn test_session_empty_stream_is_client_closed() {
    let (_temp, storage) = setup_storage();
    let report = run_session(&storage, Vec::new());

    assert_eq!(report.outcome, SessionOutcome::ClientClosed);
    assert_eq!(report.declared_count, None);
}

#[test]
fn test_session_truncated_content_is_client_closed() {
    let (temp, storage) = setup_storage();
    let mut bytes = encode_batch(1, &[("cut.txt", &b"0123456789"[..])]);
    bytes.truncate(bytes.len() - 4);

    let report = run_session(&storage, bytes);

    assert_eq!(report.outcome, SessionOutcome::ClientClosed);
    assert!(!temp.path().join("cut.txt").exists());
}

#[test]
fn test_session_negative_count_fails() {
    let (_temp, storage) = setup_storage();
    let report = run_session(&storage, encode_batch(-3, &[]));

    match report.outcome {
        SessionOutcome::Failed(msg) => assert!(msg.contains("Negative file count")),
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[test]
fn test_session_write_failure_aborts_rest() {
    let (temp, storage) = setup_storage();
    let bytes = encode_batch(2, &[("../escape.txt", &b"x"[..]), ("ok.txt", &b"y"[..])]);

    let report = run_session(&storage, bytes);

    assert!(matches!(report.outcome, SessionOutcome::Failed(_)));
    assert!(report.files.is_empty());
    // No per-file recovery on the receive side
    assert!(!temp.path().join("ok.txt").exists());
}
