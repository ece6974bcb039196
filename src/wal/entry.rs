//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::{Book, BookId, Member, MemberId};

/// Frame header: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The record mutation to apply
    pub record: Record,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Mutations that can be logged
///
/// Every variant carries the full resulting state for the row it touches,
/// so replaying an entry twice is harmless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// Insert or replace a book
    PutBook(Book),

    /// Remove a book
    DeleteBook { id: BookId },

    /// Set a book's borrowed flag
    SetBorrowed { id: BookId, borrowed: bool },

    /// Insert or replace a member
    PutMember(Member),

    /// Remove a member
    DeleteMember { id: MemberId },
}

impl WalEntry {
    /// Create a new entry stamped with the current time
    pub fn new(lsn: u64, record: Record) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            record,
            timestamp,
        }
    }

    /// Encode as a framed entry: [lsn (8)][crc (4)][len (4)][data]
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)
            .map_err(|e| StoreError::Serialization(format!("WAL entry encode: {}", e)))?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&data).to_le_bytes());
        frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
        frame.extend_from_slice(&data);
        Ok(frame)
    }

    /// Decode one framed entry from the start of `bytes`
    ///
    /// Returns the entry and the number of bytes consumed.
    pub fn deserialize(bytes: &[u8]) -> Result<(Self, usize)> {
        let frame_len = frame_len(bytes).ok_or_else(|| {
            StoreError::WalCorruption(format!("incomplete header: {} bytes", bytes.len()))
        })?;
        if bytes.len() < frame_len {
            return Err(StoreError::WalCorruption(format!(
                "incomplete entry: expected {} bytes, got {}",
                frame_len,
                bytes.len()
            )));
        }

        let lsn = read_u64(bytes, 0);
        let crc = read_u32(bytes, 8);
        let data = &bytes[HEADER_SIZE..frame_len];

        let actual_crc = crc32fast::hash(data);
        if actual_crc != crc {
            return Err(StoreError::WalCorruption(format!(
                "CRC mismatch at lsn {}: stored {:#010x}, computed {:#010x}",
                lsn, crc, actual_crc
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| StoreError::Serialization(format!("WAL entry decode: {}", e)))?;

        if entry.lsn != lsn {
            return Err(StoreError::WalCorruption(format!(
                "LSN mismatch: header {}, payload {}",
                lsn, entry.lsn
            )));
        }

        Ok((entry, frame_len))
    }
}

/// Total frame length announced by the header, if the header is complete
pub(crate) fn frame_len(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < HEADER_SIZE {
        return None;
    }
    Some(HEADER_SIZE + read_u32(bytes, 12) as usize)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}
