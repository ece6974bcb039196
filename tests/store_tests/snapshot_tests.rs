//! Tests for snapshot files
//!
//! These tests verify:
//! - Write then load returns the same tables
//! - Missing file loads as None
//! - Corruption and bad headers are rejected

use std::fs;

use lendingdesk::store::Snapshot;
use lendingdesk::{Book, BookId, Member, MemberId, StoreError};
use tempfile::TempDir;

fn sample_snapshot() -> Snapshot {
    Snapshot {
        last_lsn: 12,
        next_book_id: 3,
        next_member_id: 2,
        books: vec![
            Book {
                id: BookId(1),
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: "9780441013593".to_string(),
                borrowed: true,
            },
            Book {
                id: BookId(2),
                title: "Emma".to_string(),
                author: "Jane Austen".to_string(),
                isbn: "0141439580".to_string(),
                borrowed: false,
            },
        ],
        members: vec![Member {
            id: MemberId(1),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }],
    }
}

#[test]
fn test_write_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.bin");
    let snapshot = sample_snapshot();

    snapshot.write(&path).unwrap();
    let loaded = Snapshot::load(&path).unwrap();

    assert_eq!(loaded, Some(snapshot));
    assert!(!temp_dir.path().join("snapshot.tmp").exists());
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();

    let loaded = Snapshot::load(&temp_dir.path().join("snapshot.bin")).unwrap();

    assert_eq!(loaded, None);
}

#[test]
fn test_overwrite_replaces_previous() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.bin");

    sample_snapshot().write(&path).unwrap();
    let empty = Snapshot::default();
    empty.write(&path).unwrap();

    assert_eq!(Snapshot::load(&path).unwrap(), Some(empty));
}

#[test]
fn test_corrupted_payload_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.bin");
    sample_snapshot().write(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(Snapshot::load(&path), Err(StoreError::Snapshot(_))));
}

#[test]
fn test_bad_magic_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.bin");
    sample_snapshot().write(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[0..4].copy_from_slice(b"NOPE");
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(Snapshot::load(&path), Err(StoreError::Snapshot(_))));
}

#[test]
fn test_truncated_file_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.bin");
    sample_snapshot().write(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(matches!(Snapshot::load(&path), Err(StoreError::Snapshot(_))));
}

#[test]
fn test_oversized_length_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.bin");
    Snapshot::default().write(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[10..18].copy_from_slice(&u64::MAX.to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(Snapshot::load(&path), Err(StoreError::Snapshot(_))));
}
