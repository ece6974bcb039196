//! Record types
//!
//! Books and members as stored by the record store, plus the input shapes
//! used to create or update them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Opaque book identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(pub u64);

/// Opaque member identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub u64);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalogued book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// 10 or 13 digits, unique across books
    pub isbn: String,
    /// Only ever flipped by the lending path
    pub borrowed: bool,
}

/// A library member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Unique across members
    pub email: String,
}

/// Fields supplied when creating or updating a book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// Fields supplied when creating or updating a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub email: String,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
        }
    }

    /// Check required fields and ISBN shape
    pub fn validate(&self) -> Result<()> {
        require_non_blank("title", &self.title)?;
        require_non_blank("author", &self.author)?;
        if !is_valid_isbn(&self.isbn) {
            return Err(StoreError::Validation(format!(
                "ISBN must be 10 or 13 digits, got {:?}",
                self.isbn
            )));
        }
        Ok(())
    }
}

impl NewMember {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Check required fields and email shape
    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        if !is_valid_email(&self.email) {
            return Err(StoreError::Validation(format!(
                "email must be a valid address, got {:?}",
                self.email
            )));
        }
        Ok(())
    }
}

/// 10 or 13 ASCII digits, nothing else
pub fn is_valid_isbn(isbn: &str) -> bool {
    matches!(isbn.len(), 10 | 13) && isbn.bytes().all(|b| b.is_ascii_digit())
}

/// One `@`, non-empty local part, non-empty domain, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
