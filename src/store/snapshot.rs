//! Snapshot files
//!
//! A checkpoint of every table, written atomically next to the WAL.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (18 bytes)                                       │
//! │   Magic: "LDSK" (4) | Version: u16 (2) | CRC: u32 (4)   │
//! │   Len: u64 (8)                                          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Payload: bincode(Snapshot)                              │
//! └─────────────────────────────────────────────────────────┘
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::{Book, Member};

/// Magic bytes identifying a LendingDesk snapshot file
pub(crate) const MAGIC: &[u8; 4] = b"LDSK";

/// Current snapshot format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + CRC (4) + Len (8) = 18 bytes
pub(crate) const HEADER_SIZE: usize = 18;

/// Full table contents as of `last_lsn`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every WAL entry up to and including this LSN is reflected here
    pub last_lsn: u64,
    pub next_book_id: u64,
    pub next_member_id: u64,
    pub books: Vec<Book>,
    pub members: Vec<Member>,
}

impl Snapshot {
    /// Write to `path` via a temp file, fsync, then rename over the old one
    pub fn write(&self, path: &Path) -> Result<()> {
        let payload = bincode::serialize(self)
            .map_err(|e| StoreError::Serialization(format!("snapshot encode: {}", e)))?;

        let tmp_path = path.with_extension("tmp");
        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            let mut writer = BufWriter::new(file);

            writer.write_all(MAGIC)?;
            writer.write_all(&VERSION.to_le_bytes())?;
            writer.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
            writer.write_all(&(payload.len() as u64).to_le_bytes())?;
            writer.write_all(&payload)?;
            writer.flush()?;

            let file = writer.into_inner().map_err(|e| {
                StoreError::Snapshot(format!("Failed to flush snapshot: {}", e))
            })?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, path)?;
        if let Some(dir) = path.parent() {
            // Persist the rename itself
            if let Err(e) = File::open(dir).and_then(|dir| dir.sync_all()) {
                tracing::warn!("Failed to sync snapshot directory {}: {}", dir.display(), e);
            }
        }
        Ok(())
    }

    /// Load a snapshot, or `None` if the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;

        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::Snapshot(format!(
                "truncated header: {} bytes",
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(StoreError::Snapshot(format!(
                "Invalid snapshot magic: expected LDSK, got {:?}",
                &bytes[0..4]
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(StoreError::Snapshot(format!(
                "Unsupported snapshot version: {}",
                version
            )));
        }

        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&bytes[6..10]);
        let crc = u32::from_le_bytes(crc_bytes);

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[10..18]);
        let len = usize::try_from(u64::from_le_bytes(len_bytes)).unwrap_or(usize::MAX);

        let available = bytes.len() - HEADER_SIZE;
        let payload = HEADER_SIZE
            .checked_add(len)
            .and_then(|end| bytes.get(HEADER_SIZE..end))
            .ok_or_else(|| {
                StoreError::Snapshot(format!(
                    "truncated payload: expected {} bytes, got {}",
                    len, available
                ))
            })?;

        if crc32fast::hash(payload) != crc {
            return Err(StoreError::Snapshot("payload CRC mismatch".to_string()));
        }

        let snapshot = bincode::deserialize(payload)
            .map_err(|e| StoreError::Serialization(format!("snapshot decode: {}", e)))?;
        Ok(Some(snapshot))
    }
}
