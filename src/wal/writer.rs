//! WAL Writer
//!
//! Handles appending entries to the WAL file.
//!
//! ## Failed Appends
//!
//! An append either leaves a complete, acknowledged frame in the log or
//! leaves the log exactly as it was. If writing or syncing a frame fails,
//! the file is cut back to its length before the frame so recovery never
//! replays a write the caller was told failed. If that cut fails too, the
//! writer refuses further appends until [`WalWriter::truncate`] or a reopen.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{Result, StoreError};

use super::{Record, WalEntry};

/// File handle the writer appends to
///
/// Implemented for [`File`]; other implementations let callers substitute
/// the handle (e.g. one that fails on demand).
pub trait LogFile: Write + Send {
    /// Flush file data to stable storage
    fn sync_data(&mut self) -> io::Result<()>;

    /// Truncate or extend the file to `len` bytes
    fn set_len(&mut self, len: u64) -> io::Result<()>;

    /// Current size in bytes
    fn size(&self) -> io::Result<u64>;
}

impl LogFile for File {
    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

/// Writes entries to the WAL file
pub struct WalWriter {
    /// Path of the log file (for diagnostics)
    path: PathBuf,

    /// Append handle
    file: Box<dyn LogFile>,

    /// Length of the log up to the last acknowledged frame
    len: u64,

    /// LSN that the next appended entry will receive
    next_lsn: u64,

    /// When to fsync
    sync_strategy: WalSyncStrategy,

    /// Entries written since the last fsync
    unsynced: usize,

    /// Entries written since the last truncate
    entries_since_truncate: usize,

    /// Set when a failed frame could not be cut back off the log
    failed: bool,
}

impl WalWriter {
    /// Open or create a WAL file, numbering new entries from `next_lsn`
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy, next_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Self::with_file(path, Box::new(file), sync_strategy, next_lsn)
    }

    /// Build a writer over an already opened handle in append mode
    pub fn with_file(
        path: &Path,
        file: Box<dyn LogFile>,
        sync_strategy: WalSyncStrategy,
        next_lsn: u64,
    ) -> Result<Self> {
        let len = file.size()?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
            next_lsn: next_lsn.max(1),
            sync_strategy,
            unsynced: 0,
            entries_since_truncate: 0,
            failed: false,
        })
    }

    /// Append a record to the WAL
    ///
    /// Returns the LSN assigned to the entry. The bytes reach the OS before
    /// this returns; fsync follows the configured strategy. On error the
    /// frame is not in the log and its LSN is handed to the next append.
    pub fn append(&mut self, record: Record) -> Result<u64> {
        if self.failed {
            return Err(StoreError::WalWrite(format!(
                "{} has an unremoved failed frame; truncate or reopen",
                self.path.display()
            )));
        }

        let lsn = self.next_lsn;
        let bytes = WalEntry::new(lsn, record).serialize()?;

        if let Err(e) = self.write_frame(&bytes) {
            self.roll_back(lsn);
            return Err(StoreError::WalWrite(format!(
                "append lsn {} to {}: {}",
                lsn,
                self.path.display(),
                e
            )));
        }

        self.len += bytes.len() as u64;
        self.next_lsn += 1;
        self.entries_since_truncate += 1;
        if self.needs_sync() {
            self.unsynced = 0;
        } else {
            self.unsynced += 1;
        }

        Ok(lsn)
    }

    fn needs_sync(&self) -> bool {
        match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count,
        }
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()?;
        if self.needs_sync() {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cut the log back to the last acknowledged frame
    fn roll_back(&mut self, lsn: u64) {
        match self.file.set_len(self.len) {
            Ok(()) => {
                tracing::warn!(
                    "WAL append of lsn {} failed; log cut back to {} bytes",
                    lsn,
                    self.len
                );
            }
            Err(e) => {
                self.failed = true;
                tracing::error!(
                    "WAL append of lsn {} failed and {} could not be cut back: {}",
                    lsn,
                    self.path.display(),
                    e
                );
            }
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop all entries (after their effects are durable elsewhere)
    ///
    /// LSNs keep increasing across truncation. Clears a failed state.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.set_len(0)?;
        self.file.sync_data()?;
        self.len = 0;
        self.unsynced = 0;
        self.entries_since_truncate = 0;
        self.failed = false;
        Ok(())
    }

    /// Get the LSN the next entry will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries appended since the log was last truncated
    pub fn entries_since_truncate(&self) -> usize {
        self.entries_since_truncate
    }

    /// Whether appends are refused until truncate or reopen
    pub fn is_failed(&self) -> bool {
        self.failed
    }
}
