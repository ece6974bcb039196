//! Lending Module
//!
//! The borrow/return core.
//!
//! ## Components
//! - [`state_machine`]: pure decision of a transition against a book's flag
//! - [`locks`]: per-book exclusive sections
//! - [`LendingDesk`]: orchestrates checks, locking, decision and write
//!
//! ## Flow
//! ```text
//! borrow(book, member)
//!   │
//!   ├─▶ MemberStore::member_exists ── no ──▶ MemberNotFound
//!   │
//!   ├─▶ BookLocks::acquire(book)            (held until return)
//!   ├─▶ BookStore::get_book ──────── none ─▶ BookNotFound
//!   ├─▶ decide(borrowed, Borrow) ─ conflict ▶ Conflict(AlreadyBorrowed)
//!   └─▶ BookStore::compare_and_set_borrowed(false → true)
//! ```

pub mod state_machine;
pub mod locks;
mod error;
mod desk;

pub use desk::LendingDesk;
pub use error::{LendingError, LendingResult};
pub use locks::{BookGuard, BookLocks};
pub use state_machine::{decide, BookState, ConflictReason, Decision, Transition};
