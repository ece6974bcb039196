//! Lending coordinator
//!
//! Runs a borrow or return end to end: existence checks, the per-book
//! exclusive section, the state machine decision and the single write.

use std::sync::Arc;

use crate::model::{BookId, MemberId};
use crate::store::{BookStore, MemberStore};

use super::error::{LendingError, LendingResult};
use super::locks::BookLocks;
use super::state_machine::{decide, ConflictReason, Decision, Transition};

/// Coordinates lending transitions over a book store and a member store
///
/// ## Concurrency
///
/// Safe to share across threads. For one book id, load → decide → write
/// happens inside that book's exclusive section, and the write is a
/// compare-and-set on the flag that was read. Books never wait on each
/// other. The member check runs before the section is entered.
///
/// ## Writes
///
/// Exactly one store write on success, none on any failure.
pub struct LendingDesk {
    books: Arc<dyn BookStore>,
    members: Arc<dyn MemberStore>,
    locks: BookLocks,
}

impl LendingDesk {
    pub fn new(books: Arc<dyn BookStore>, members: Arc<dyn MemberStore>) -> Self {
        Self {
            books,
            members,
            locks: BookLocks::new(),
        }
    }

    /// Lend `book_id` to `member_id`
    ///
    /// A missing member is reported before the book is looked at, so it wins
    /// when both ids are unknown.
    pub fn borrow(&self, book_id: BookId, member_id: MemberId) -> LendingResult<()> {
        if !self.members.member_exists(member_id)? {
            tracing::debug!("Borrow of book {} refused: member {} not found", book_id, member_id);
            return Err(LendingError::MemberNotFound(member_id));
        }

        self.transition(book_id, Transition::Borrow)?;
        tracing::info!("Book {} borrowed by member {}", book_id, member_id);
        Ok(())
    }

    /// Take `book_id` back
    pub fn return_book(&self, book_id: BookId) -> LendingResult<()> {
        self.transition(book_id, Transition::Return)?;
        tracing::info!("Book {} returned", book_id);
        Ok(())
    }

    /// Load, decide and write under the book's lock
    fn transition(&self, book_id: BookId, transition: Transition) -> LendingResult<()> {
        let _guard = self.locks.acquire(book_id);

        let book = self
            .books
            .get_book(book_id)?
            .ok_or(LendingError::BookNotFound(book_id))?;

        let borrowed = match decide(book.borrowed, transition) {
            Decision::Proceed { borrowed } => borrowed,
            Decision::Conflict(reason) => {
                tracing::debug!("{:?} of book {} refused: {}", transition, book_id, reason);
                return Err(LendingError::Conflict { book_id, reason });
            }
        };

        if self.books.compare_and_set_borrowed(book_id, book.borrowed, borrowed)? {
            return Ok(());
        }

        // The flag moved under us outside the lending path (e.g. a delete);
        // report what the book looks like now.
        match self.books.get_book(book_id)? {
            None => Err(LendingError::BookNotFound(book_id)),
            Some(_) => Err(LendingError::Conflict {
                book_id,
                reason: match transition {
                    Transition::Borrow => ConflictReason::AlreadyBorrowed,
                    Transition::Return => ConflictReason::NotBorrowed,
                },
            }),
        }
    }

    /// Books with a transition currently in flight
    pub fn books_in_flight(&self) -> usize {
        self.locks.active()
    }
}
