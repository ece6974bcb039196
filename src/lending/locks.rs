//! Per-book lock table
//!
//! Hands out one exclusive section per book id. Slots are created on first
//! use and removed when the last holder or waiter lets go, so the table only
//! holds books with a transition in flight. Different ids never share a lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use crate::model::BookId;

/// Lock table keyed by book id
#[derive(Default)]
pub struct BookLocks {
    /// Live slots; an `Arc` clone is taken under this mutex before waiting
    slots: Mutex<HashMap<BookId, Arc<Mutex<()>>>>,
}

/// Exclusive hold on one book, released on drop
pub struct BookGuard<'a> {
    locks: &'a BookLocks,
    id: BookId,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl BookLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until this thread holds the section for `id`
    pub fn acquire(&self, id: BookId) -> BookGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(id).or_default())
        };

        let guard = match slot.try_lock_arc() {
            Some(guard) => guard,
            None => {
                tracing::trace!("Waiting for lock on book {}", id);
                slot.lock_arc()
            }
        };

        BookGuard {
            locks: self,
            id,
            guard: Some(guard),
        }
    }

    /// Number of books currently held or waited on
    pub fn active(&self) -> usize {
        self.slots.lock().len()
    }
}

impl BookGuard<'_> {
    /// The book this guard covers
    pub fn book_id(&self) -> BookId {
        self.id
    }
}

impl Drop for BookGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so our own Arc clone is gone before counting
        drop(self.guard.take());

        let mut slots = self.locks.slots.lock();
        let idle = slots
            .get(&self.id)
            .map(|slot| Arc::strong_count(slot) == 1)
            .unwrap_or(false);
        if idle {
            slots.remove(&self.id);
        }
    }
}
