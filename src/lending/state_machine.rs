//! Lending state machine
//!
//! Decides whether a borrow or return is legal for a book's current state.
//! Pure: no I/O, no locking, same answer for the same inputs.
//!
//! ```text
//!              Borrow
//!   Available ────────▶ OnLoan
//!       ▲                 │
//!       └──────Return─────┘
//! ```
//!
//! Borrowing an `OnLoan` book and returning an `Available` one are
//! conflicts; the state is left as it was.

use std::fmt;

/// Lending state of a single book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookState {
    /// `borrowed = false`
    Available,
    /// `borrowed = true`
    OnLoan,
}

impl BookState {
    pub fn from_borrowed(borrowed: bool) -> Self {
        if borrowed {
            BookState::OnLoan
        } else {
            BookState::Available
        }
    }

    pub fn is_borrowed(self) -> bool {
        self == BookState::OnLoan
    }
}

impl fmt::Display for BookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookState::Available => write!(f, "available"),
            BookState::OnLoan => write!(f, "on loan"),
        }
    }
}

/// A requested lending transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Borrow,
    Return,
}

impl Transition {
    /// State the book must be in for this transition to apply
    pub fn from_state(self) -> BookState {
        match self {
            Transition::Borrow => BookState::Available,
            Transition::Return => BookState::OnLoan,
        }
    }

    /// State the book is in after this transition applies
    pub fn to_state(self) -> BookState {
        match self {
            Transition::Borrow => BookState::OnLoan,
            Transition::Return => BookState::Available,
        }
    }
}

/// Why a transition was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Borrow requested while the book is on loan
    AlreadyBorrowed,
    /// Return requested while the book is available
    NotBorrowed,
}

impl ConflictReason {
    /// The state the transition required
    pub fn expected(self) -> BookState {
        match self {
            ConflictReason::AlreadyBorrowed => BookState::Available,
            ConflictReason::NotBorrowed => BookState::OnLoan,
        }
    }

    /// The state the book was actually in
    pub fn actual(self) -> BookState {
        match self {
            ConflictReason::AlreadyBorrowed => BookState::OnLoan,
            ConflictReason::NotBorrowed => BookState::Available,
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::AlreadyBorrowed => write!(f, "already borrowed"),
            ConflictReason::NotBorrowed => write!(f, "not currently borrowed"),
        }
    }
}

/// Outcome of [`decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Legal; persist `borrowed`
    Proceed { borrowed: bool },
    /// Illegal; the book keeps its current state
    Conflict(ConflictReason),
}

/// Decide a transition against the current `borrowed` flag
pub fn decide(borrowed: bool, transition: Transition) -> Decision {
    let current = BookState::from_borrowed(borrowed);
    if current == transition.from_state() {
        return Decision::Proceed {
            borrowed: transition.to_state().is_borrowed(),
        };
    }
    match transition {
        Transition::Borrow => Decision::Conflict(ConflictReason::AlreadyBorrowed),
        Transition::Return => Decision::Conflict(ConflictReason::NotBorrowed),
    }
}
