//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::Result;

use super::entry::frame_len;
use super::WalEntry;

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN (0 if none)
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,
}

/// Outcome of scanning a WAL image
struct Scan {
    entries: Vec<WalEntry>,
    result: RecoveryResult,
    /// Offset where the valid prefix ends
    valid_len: usize,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Detect and skip corrupted entries
    /// 3. Truncate partial writes at end
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let bytes = fs::read(path)?;
        let mut scan = Self::scan(&bytes);

        if scan.valid_len < bytes.len() {
            tracing::warn!(
                "Truncating {} trailing bytes of partial WAL entry in {}",
                bytes.len() - scan.valid_len,
                path.display()
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(scan.valid_len as u64)?;
            file.sync_all()?;
            scan.result.was_truncated = true;
        }

        Ok((scan.entries, scan.result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let bytes = fs::read(path)?;
        let scan = Self::scan(&bytes);
        let mut result = scan.result;
        result.was_truncated = scan.valid_len < bytes.len();
        Ok(result)
    }

    fn scan(bytes: &[u8]) -> Scan {
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();
        let mut pos = 0;

        while pos < bytes.len() {
            let remaining = &bytes[pos..];
            let len = match frame_len(remaining) {
                Some(len) if len <= remaining.len() => len,
                // Header or payload cut short: a torn write at the tail
                _ => break,
            };

            match WalEntry::deserialize(&remaining[..len]) {
                Ok((entry, _)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                }
                Err(e) => {
                    tracing::warn!("Skipping corrupted WAL entry at offset {}: {}", pos, e);
                    result.entries_corrupted += 1;
                }
            }
            pos += len;
        }

        Scan {
            entries,
            result,
            valid_len: pos,
        }
    }
}
