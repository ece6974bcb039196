//! In-memory tables
//!
//! Books and members keyed by id, with unique-value indexes for ISBN and
//! email. Mutations arrive as WAL [`Record`]s so that live writes and
//! replay share one code path.

use std::collections::{BTreeMap, HashMap};

use crate::model::{Book, BookId, Member, MemberId};
use crate::wal::Record;

use super::Snapshot;

#[derive(Debug)]
pub(super) struct Tables {
    pub books: BTreeMap<BookId, Book>,
    pub members: BTreeMap<MemberId, Member>,
    /// isbn → owning book
    pub isbn_index: HashMap<String, BookId>,
    /// email → owning member
    pub email_index: HashMap<String, MemberId>,
    pub next_book_id: u64,
    pub next_member_id: u64,
    /// LSN of the last record applied
    pub last_lsn: u64,
}

impl Tables {
    pub fn new() -> Self {
        Self {
            books: BTreeMap::new(),
            members: BTreeMap::new(),
            isbn_index: HashMap::new(),
            email_index: HashMap::new(),
            next_book_id: 1,
            next_member_id: 1,
            last_lsn: 0,
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables = Self::new();
        for book in snapshot.books {
            tables.put_book(book);
        }
        for member in snapshot.members {
            tables.put_member(member);
        }
        tables.next_book_id = tables.next_book_id.max(snapshot.next_book_id);
        tables.next_member_id = tables.next_member_id.max(snapshot.next_member_id);
        tables.last_lsn = snapshot.last_lsn;
        tables
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            last_lsn: self.last_lsn,
            next_book_id: self.next_book_id,
            next_member_id: self.next_member_id,
            books: self.books.values().cloned().collect(),
            members: self.members.values().cloned().collect(),
        }
    }

    /// Apply a logged mutation
    ///
    /// Infallible: callers validate before logging, and replay trusts the log.
    pub fn apply(&mut self, lsn: u64, record: Record) {
        match record {
            Record::PutBook(book) => self.put_book(book),
            Record::DeleteBook { id } => {
                if let Some(book) = self.books.remove(&id) {
                    self.isbn_index.remove(&book.isbn);
                }
            }
            Record::SetBorrowed { id, borrowed } => {
                if let Some(book) = self.books.get_mut(&id) {
                    book.borrowed = borrowed;
                }
            }
            Record::PutMember(member) => self.put_member(member),
            Record::DeleteMember { id } => {
                if let Some(member) = self.members.remove(&id) {
                    self.email_index.remove(&member.email);
                }
            }
        }
        self.last_lsn = self.last_lsn.max(lsn);
    }

    /// Whether `isbn` belongs to a book other than `except`
    pub fn isbn_taken(&self, isbn: &str, except: Option<BookId>) -> bool {
        matches!(self.isbn_index.get(isbn), Some(owner) if Some(*owner) != except)
    }

    /// Whether `email` belongs to a member other than `except`
    pub fn email_taken(&self, email: &str, except: Option<MemberId>) -> bool {
        matches!(self.email_index.get(email), Some(owner) if Some(*owner) != except)
    }

    fn put_book(&mut self, book: Book) {
        if let Some(previous) = self.books.get(&book.id) {
            self.isbn_index.remove(&previous.isbn);
        }
        self.isbn_index.insert(book.isbn.clone(), book.id);
        self.next_book_id = self.next_book_id.max(book.id.0 + 1);
        self.books.insert(book.id, book);
    }

    fn put_member(&mut self, member: Member) {
        if let Some(previous) = self.members.get(&member.id) {
            self.email_index.remove(&previous.email);
        }
        self.email_index.insert(member.email.clone(), member.id);
        self.next_member_id = self.next_member_id.max(member.id.0 + 1);
        self.members.insert(member.id, member);
    }
}
