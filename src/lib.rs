//! # LendingDesk
//!
//! A book lending core with:
//! - A pure borrow/return state machine
//! - Per-book exclusive sections so concurrent requests cannot double-lend
//! - A durable record store with Write-Ahead Logging (WAL) and snapshots
//! - Crash recovery with partial write handling
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Callers                                │
//! │              (one thread per request)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   LendingDesk                                │
//! │      member check → book lock → decide → compare-and-set     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ BookStore / MemberStore
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   RecordStore                                │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │   Tables    │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ checkpoint
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Snapshot   │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod model;

pub mod wal;
pub mod store;
pub mod lending;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::Config;
pub use model::{Book, BookId, Member, MemberId, NewBook, NewMember};
pub use store::{BookStore, MemberStore, RecordStore};
pub use lending::{LendingDesk, LendingError, LendingResult};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LendingDesk
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
