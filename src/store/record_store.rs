//! Record Store
//!
//! The WAL-backed store that coordinates the log, the in-memory tables and
//! snapshots.
//!
//! ## Responsibilities
//! - Validate and apply catalog writes (books, members)
//! - Provide the atomic compare-and-set the lending core relies on
//! - Checkpoint tables to a snapshot and truncate the WAL
//! - Manage crash recovery on startup

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::model::{Book, BookId, Member, MemberId, NewBook, NewMember};
use crate::wal::{Record, WalRecovery, WalWriter};

use super::tables::Tables;
use super::{BookStore, MemberStore, Snapshot};

/// Durable store for books and members
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes**: hold the `tables` write lock for validate → WAL → apply,
///   so a check such as ISBN uniqueness or the borrowed flag cannot go stale
///   before the write lands. Lock order is always `tables` → `wal`.
/// - **Reads**: share the `tables` read lock and never touch the WAL.
///
/// A failed WAL append returns before `apply`, leaving the tables unchanged.
pub struct RecordStore {
    /// Store configuration
    config: Config,

    /// Path of the snapshot file
    snapshot_path: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// Current state of every record
    tables: RwLock<Tables>,
}

impl RecordStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SNAPSHOT_FILENAME: &'static str = "snapshot.bin";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Load the last snapshot if present
    /// 3. Replay WAL entries newer than the snapshot
    /// 4. Checkpoint whatever was replayed, then serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let wal_path = config.data_dir.join(Self::WAL_FILENAME);
        let snapshot_path = config.data_dir.join(Self::SNAPSHOT_FILENAME);

        let mut tables = match Snapshot::load(&snapshot_path)? {
            Some(snapshot) => {
                tracing::debug!(
                    "Loaded snapshot: {} books, {} members, last_lsn={}",
                    snapshot.books.len(),
                    snapshot.members.len(),
                    snapshot.last_lsn
                );
                Tables::from_snapshot(snapshot)
            }
            None => Tables::new(),
        };

        let mut replayed = 0u64;
        let mut last_logged_lsn = tables.last_lsn;
        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_corrupted > 0 || recovery.was_truncated {
                tracing::warn!(
                    "WAL recovery: {} entries recovered, {} corrupted, truncated={}",
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.was_truncated
                );
            }

            for entry in entries {
                // Already reflected in the snapshot
                if entry.lsn <= tables.last_lsn {
                    continue;
                }
                tables.apply(entry.lsn, entry.record);
                replayed += 1;
            }
            last_logged_lsn = last_logged_lsn.max(recovery.last_lsn);
        }

        let mut wal = WalWriter::open(&wal_path, config.wal_sync_strategy, last_logged_lsn + 1)?;

        // Make replayed entries durable in the snapshot so the WAL can start empty
        if replayed > 0 {
            tracing::info!("Replayed {} WAL entries, checkpointing", replayed);
            Self::checkpoint_locked(&snapshot_path, &tables, &mut wal)?;
        }

        tracing::info!(
            "Record store open at {}: {} books, {} members",
            config.data_dir.display(),
            tables.books.len(),
            tables.members.len()
        );

        Ok(Self {
            config,
            snapshot_path,
            wal: Mutex::new(wal),
            tables: RwLock::new(tables),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Add a book to the catalog; it starts available
    pub fn insert_book(&self, new: NewBook) -> Result<Book> {
        new.validate()?;
        let mut tables = self.tables.write();

        if tables.isbn_taken(&new.isbn, None) {
            return Err(StoreError::DuplicateIsbn(new.isbn));
        }

        let book = Book {
            id: BookId(tables.next_book_id),
            title: new.title,
            author: new.author,
            isbn: new.isbn,
            borrowed: false,
        };
        self.commit(&mut tables, Record::PutBook(book.clone()))?;

        tracing::info!("Book {} added (isbn {})", book.id, book.isbn);
        Ok(book)
    }

    /// Replace a book's title, author and ISBN; `borrowed` is left alone
    pub fn update_book(&self, id: BookId, new: NewBook) -> Result<Book> {
        new.validate()?;
        let mut tables = self.tables.write();

        let borrowed = match tables.books.get(&id) {
            Some(book) => book.borrowed,
            None => return Err(StoreError::BookNotFound(id)),
        };
        if tables.isbn_taken(&new.isbn, Some(id)) {
            return Err(StoreError::DuplicateIsbn(new.isbn));
        }

        let book = Book {
            id,
            title: new.title,
            author: new.author,
            isbn: new.isbn,
            borrowed,
        };
        self.commit(&mut tables, Record::PutBook(book.clone()))?;
        Ok(book)
    }

    /// Remove a book
    ///
    /// The borrowed flag is not consulted: a book on loan can be deleted.
    pub fn delete_book(&self, id: BookId) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.books.contains_key(&id) {
            return Err(StoreError::BookNotFound(id));
        }
        self.commit(&mut tables, Record::DeleteBook { id })?;
        tracing::info!("Book {} deleted", id);
        Ok(())
    }

    /// All books in id order
    pub fn list_books(&self) -> Vec<Book> {
        self.tables.read().books.values().cloned().collect()
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Register a member
    pub fn insert_member(&self, new: NewMember) -> Result<Member> {
        new.validate()?;
        let mut tables = self.tables.write();

        if tables.email_taken(&new.email, None) {
            return Err(StoreError::DuplicateEmail(new.email));
        }

        let member = Member {
            id: MemberId(tables.next_member_id),
            name: new.name,
            email: new.email,
        };
        self.commit(&mut tables, Record::PutMember(member.clone()))?;

        tracing::info!("Member {} registered", member.id);
        Ok(member)
    }

    /// Load a member by id
    pub fn get_member(&self, id: MemberId) -> Option<Member> {
        self.tables.read().members.get(&id).cloned()
    }

    /// Replace a member's name and email
    pub fn update_member(&self, id: MemberId, new: NewMember) -> Result<Member> {
        new.validate()?;
        let mut tables = self.tables.write();

        if !tables.members.contains_key(&id) {
            return Err(StoreError::MemberNotFound(id));
        }
        if tables.email_taken(&new.email, Some(id)) {
            return Err(StoreError::DuplicateEmail(new.email));
        }

        let member = Member {
            id,
            name: new.name,
            email: new.email,
        };
        self.commit(&mut tables, Record::PutMember(member.clone()))?;
        Ok(member)
    }

    /// Remove a member
    pub fn delete_member(&self, id: MemberId) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.members.contains_key(&id) {
            return Err(StoreError::MemberNotFound(id));
        }
        self.commit(&mut tables, Record::DeleteMember { id })?;
        tracing::info!("Member {} deleted", id);
        Ok(())
    }

    /// All members in id order
    pub fn list_members(&self) -> Vec<Member> {
        self.tables.read().members.values().cloned().collect()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Write a snapshot of every table and truncate the WAL
    pub fn checkpoint(&self) -> Result<()> {
        let tables = self.tables.write();
        let mut wal = self.wal.lock();
        Self::checkpoint_locked(&self.snapshot_path, &tables, &mut wal)
    }

    /// Force the WAL to disk
    pub fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }

    /// Close the store gracefully
    ///
    /// Checkpoints any logged entries and syncs to disk
    pub fn close(self) -> Result<()> {
        let tables = self.tables.into_inner();
        let mut wal = self.wal.into_inner();

        if wal.entries_since_truncate() > 0 {
            Self::checkpoint_locked(&self.snapshot_path, &tables, &mut wal)?;
        }
        wal.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of WAL entries not yet folded into a snapshot
    pub fn wal_entry_count(&self) -> usize {
        self.wal.lock().entries_since_truncate()
    }

    /// LSN of the last applied record
    pub fn last_lsn(&self) -> u64 {
        self.tables.read().last_lsn
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Log then apply a record (called with the tables write lock held)
    ///
    /// A failed append leaves neither the tables nor the log changed.
    fn commit(&self, tables: &mut Tables, record: Record) -> Result<()> {
        let mut wal = self.wal.lock();
        let lsn = wal.append(record.clone())?;
        tables.apply(lsn, record);

        // The write itself is durable in the WAL; a failed checkpoint only
        // means the log keeps growing until the next attempt.
        if wal.entries_since_truncate() >= self.config.checkpoint_interval {
            if let Err(e) = Self::checkpoint_locked(&self.snapshot_path, tables, &mut wal) {
                tracing::warn!("Automatic checkpoint failed: {}", e);
            }
        }
        Ok(())
    }

    /// Snapshot then truncate (called with both locks held)
    fn checkpoint_locked(snapshot_path: &Path, tables: &Tables, wal: &mut WalWriter) -> Result<()> {
        tables.to_snapshot().write(snapshot_path)?;
        wal.truncate()?;
        tracing::debug!("Checkpoint written at lsn {}", tables.last_lsn);
        Ok(())
    }
}

impl BookStore for RecordStore {
    fn get_book(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.tables.read().books.get(&id).cloned())
    }

    fn book_exists(&self, id: BookId) -> Result<bool> {
        Ok(self.tables.read().books.contains_key(&id))
    }

    fn compare_and_set_borrowed(&self, id: BookId, expected: bool, new: bool) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.books.get(&id) {
            Some(book) if book.borrowed == expected => {}
            _ => return Ok(false),
        }
        self.commit(&mut tables, Record::SetBorrowed { id, borrowed: new })?;
        Ok(true)
    }
}

impl MemberStore for RecordStore {
    fn member_exists(&self, id: MemberId) -> Result<bool> {
        Ok(self.tables.read().members.contains_key(&id))
    }
}
