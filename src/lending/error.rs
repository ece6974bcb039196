//! Lending outcomes
//!
//! Every failure of a borrow or return is a distinct variant carrying the
//! ids involved, so a transport layer can render a precise response.

use thiserror::Error;

use crate::error::StoreError;
use crate::model::{BookId, MemberId};

use super::state_machine::ConflictReason;

/// Result type alias for lending operations
pub type LendingResult<T> = std::result::Result<T, LendingError>;

/// Why a borrow or return did not happen
#[derive(Debug, Error)]
pub enum LendingError {
    #[error("Member not found with id: {0}")]
    MemberNotFound(MemberId),

    #[error("Book not found with id: {0}")]
    BookNotFound(BookId),

    #[error("Book {book_id} is {reason} (expected {}, found {})", .reason.expected(), .reason.actual())]
    Conflict {
        book_id: BookId,
        reason: ConflictReason,
    },

    /// The store failed mid-request; not retried
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl LendingError {
    /// HTTP-style status for this outcome (success maps to 200)
    pub fn status_code(&self) -> u16 {
        match self {
            LendingError::MemberNotFound(_) => 400,
            LendingError::BookNotFound(_) => 404,
            LendingError::Conflict { .. } => 409,
            LendingError::Storage(_) => 500,
        }
    }

    /// The conflict reason, if this is a conflict
    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            LendingError::Conflict { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
