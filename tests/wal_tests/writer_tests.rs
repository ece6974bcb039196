//! Tests for WAL Writer
//!
//! These tests verify:
//! - LSN generation and sequencing
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Truncation keeps LSNs increasing
//! - Appending to an existing log
//! - Failed appends leave nothing behind

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lendingdesk::config::WalSyncStrategy;
use lendingdesk::wal::{LogFile, Record, WalRecovery, WalWriter};
use lendingdesk::{BookId, StoreError};
use tempfile::TempDir;

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn flag(id: u64, borrowed: bool) -> Record {
    Record::SetBorrowed { id: BookId(id), borrowed }
}

#[test]
fn test_append_assigns_sequential_lsns() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite, 1).unwrap();

    assert_eq!(writer.append(flag(1, true)).unwrap(), 1);
    assert_eq!(writer.append(flag(1, false)).unwrap(), 2);
    assert_eq!(writer.current_lsn(), 3);
    assert_eq!(writer.entries_since_truncate(), 2);
}

#[test]
fn test_open_starts_at_given_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite, 50).unwrap();

    assert_eq!(writer.append(flag(1, true)).unwrap(), 50);
}

#[test]
fn test_lsn_zero_is_never_issued() {
    let (_temp, wal_path) = setup_temp_wal();
    let writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite, 0).unwrap();

    assert_eq!(writer.current_lsn(), 1);
}

#[test]
fn test_entries_readable_after_batched_sync() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer =
            WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 4 }, 1).unwrap();
        for i in 0..10 {
            writer.append(flag(i, i % 2 == 0)).unwrap();
        }
        writer.sync().unwrap();
    }

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 10);
    assert_eq!(result.last_lsn, 10);
    assert_eq!(entries[3].record, flag(3, false));
}

#[test]
fn test_truncate_empties_log_and_keeps_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite, 1).unwrap();
    writer.append(flag(1, true)).unwrap();
    writer.append(flag(2, true)).unwrap();

    writer.truncate().unwrap();

    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), 0);
    assert_eq!(writer.entries_since_truncate(), 0);
    assert_eq!(writer.append(flag(3, true)).unwrap(), 3);

    let (entries, _) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lsn, 3);
}

#[test]
fn test_reopen_appends_to_existing_log() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite, 1).unwrap();
        writer.append(flag(1, true)).unwrap();
    }
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite, 2).unwrap();
        writer.append(flag(1, false)).unwrap();
    }

    let (entries, _) = WalRecovery::recover(&wal_path).unwrap();
    let lsns: Vec<u64> = entries.iter().map(|e| e.lsn).collect();
    assert_eq!(lsns, vec![1, 2]);
}

// =============================================================================
// Failed Appends
// =============================================================================

/// Switches that make the next fsync or truncate fail
#[derive(Clone, Default)]
struct Faults {
    sync: Arc<AtomicBool>,
    set_len: Arc<AtomicBool>,
}

/// Real file whose fsync and truncate can be made to fail
struct FlakyFile {
    inner: File,
    faults: Faults,
}

impl Write for FlakyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl LogFile for FlakyFile {
    fn sync_data(&mut self) -> io::Result<()> {
        if self.faults.sync.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected fsync failure"));
        }
        self.inner.sync_data()
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        if self.faults.set_len.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected truncate failure"));
        }
        self.inner.set_len(len)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.inner.metadata()?.len())
    }
}

fn flaky_writer(path: &Path, strategy: WalSyncStrategy) -> (WalWriter, Faults) {
    let faults = Faults::default();
    let inner = OpenOptions::new().create(true).append(true).open(path).unwrap();
    let file = FlakyFile { inner, faults: faults.clone() };
    let writer = WalWriter::with_file(path, Box::new(file), strategy, 1).unwrap();
    (writer, faults)
}

#[test]
fn test_failed_sync_leaves_no_entry_behind() {
    let (_temp, wal_path) = setup_temp_wal();
    let (mut writer, faults) = flaky_writer(&wal_path, WalSyncStrategy::EveryWrite);

    assert_eq!(writer.append(flag(1, true)).unwrap(), 1);
    let len_before = std::fs::metadata(&wal_path).unwrap().len();

    faults.sync.store(true, Ordering::SeqCst);
    let result = writer.append(flag(2, true));
    assert!(matches!(result, Err(StoreError::WalWrite(_))));

    // The bytes reached the file before fsync failed; they must be gone
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), len_before);
    assert_eq!(writer.current_lsn(), 2);
    assert!(!writer.is_failed());

    faults.sync.store(false, Ordering::SeqCst);
    assert_eq!(writer.append(flag(3, false)).unwrap(), 2);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    let records: Vec<Record> = entries.into_iter().map(|e| e.record).collect();
    assert_eq!(records, vec![flag(1, true), flag(3, false)]);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 2);
}

#[test]
fn test_failed_batch_sync_keeps_earlier_entries() {
    let (_temp, wal_path) = setup_temp_wal();
    let (mut writer, faults) =
        flaky_writer(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 });

    writer.append(flag(1, true)).unwrap();
    writer.append(flag(2, true)).unwrap();

    // Third append triggers the batch fsync
    faults.sync.store(true, Ordering::SeqCst);
    assert!(writer.append(flag(3, true)).is_err());
    faults.sync.store(false, Ordering::SeqCst);
    writer.sync().unwrap();

    let (entries, _) = WalRecovery::recover(&wal_path).unwrap();
    let lsns: Vec<u64> = entries.iter().map(|e| e.lsn).collect();
    assert_eq!(lsns, vec![1, 2]);
}

#[test]
fn test_writer_refuses_appends_when_rollback_fails() {
    let (_temp, wal_path) = setup_temp_wal();
    let (mut writer, faults) = flaky_writer(&wal_path, WalSyncStrategy::EveryWrite);
    writer.append(flag(1, true)).unwrap();

    faults.sync.store(true, Ordering::SeqCst);
    faults.set_len.store(true, Ordering::SeqCst);
    assert!(writer.append(flag(2, true)).is_err());
    assert!(writer.is_failed());

    // Healthy again, but the stray frame is still on disk
    faults.sync.store(false, Ordering::SeqCst);
    faults.set_len.store(false, Ordering::SeqCst);
    assert!(matches!(writer.append(flag(3, true)), Err(StoreError::WalWrite(_))));

    writer.truncate().unwrap();
    assert!(!writer.is_failed());
    assert_eq!(writer.append(flag(4, true)).unwrap(), 2);

    let (entries, _) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].record, flag(4, true));
}
