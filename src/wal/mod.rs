//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees for the record store through append-only
//! logging.
//!
//! ## Responsibilities
//! - Append log entries before any mutation is applied in memory
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery and replay
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Data is the bincode encoding of [`WalEntry`]; the CRC covers Data only.

mod entry;
mod writer;
mod recovery;

pub use entry::{WalEntry, Record, HEADER_SIZE};
pub use writer::{LogFile, WalWriter};
pub use recovery::{WalRecovery, RecoveryResult};
