//! Error types for LendingDesk storage
//!
//! Provides a unified error type for record store operations. Lending
//! outcomes have their own taxonomy in [`crate::lending::LendingError`].

use thiserror::Error;

use crate::model::{BookId, MemberId};

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for record store operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Catalog Errors
    // -------------------------------------------------------------------------
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A book with ISBN {0} already exists")]
    DuplicateIsbn(String),

    #[error("A member with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Book not found with id: {0}")]
    BookNotFound(BookId),

    #[error("Member not found with id: {0}")]
    MemberNotFound(MemberId),
}

impl StoreError {
    /// Whether this error reports a missing record rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::BookNotFound(_) | StoreError::MemberNotFound(_))
    }
}
