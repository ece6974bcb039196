//! Storage Module
//!
//! Durable keyed storage for books and members.
//!
//! ## Responsibilities
//! - Expose the narrow store interfaces the lending core consumes
//!   ([`BookStore`], [`MemberStore`])
//! - Provide [`RecordStore`], a WAL-backed implementation of both
//! - Checkpoint in-memory tables to a snapshot file and truncate the WAL
//!
//! ## On-Disk Layout
//! ```text
//! {data_dir}/
//!   ├── wal.log        entries since the last checkpoint
//!   └── snapshot.bin   full tables as of snapshot.last_lsn
//! ```

mod record_store;
mod snapshot;
mod tables;

use crate::error::Result;
use crate::model::{Book, BookId, MemberId};

pub use record_store::RecordStore;
pub use snapshot::Snapshot;

/// Book access needed by the lending core
pub trait BookStore: Send + Sync {
    /// Load a book by id
    fn get_book(&self, id: BookId) -> Result<Option<Book>>;

    /// Whether a book with this id exists
    fn book_exists(&self, id: BookId) -> Result<bool>;

    /// Set `borrowed` to `new` only if it currently equals `expected`
    ///
    /// Returns `Ok(false)` when the book is missing or the flag did not match;
    /// nothing is written in that case.
    fn compare_and_set_borrowed(&self, id: BookId, expected: bool, new: bool) -> Result<bool>;
}

/// Member access needed by the lending core
pub trait MemberStore: Send + Sync {
    /// Whether a member with this id exists
    fn member_exists(&self, id: MemberId) -> Result<bool>;
}
