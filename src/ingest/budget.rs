// src/ingest/budget.rs
//! Shared countdown of how many items the pipeline still needs.
//!
//! Check and decrement happen in one atomic step (`try_reserve`), so two workers
//! can never both be granted the same remaining slots.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of a reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// How many of the requested items were admitted (`0..=requested`).
    pub granted: usize,
    /// Budget is zero after this reservation.
    pub exhausted: bool,
}

#[derive(Debug)]
pub struct RemainingBudget {
    initial: usize,
    remaining: AtomicUsize,
}

impl RemainingBudget {
    pub fn new(initial: usize) -> Self {
        Self {
            initial,
            remaining: AtomicUsize::new(initial),
        }
    }

    pub fn read(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    /// Total handed out so far.
    pub fn granted_total(&self) -> usize {
        self.initial - self.read()
    }

    pub fn try_reserve(&self, requested: usize) -> Reservation {
        // The closure always returns Some, so both arms carry the previous value.
        let prev = match self.remaining.fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
            Some(cur - requested.min(cur))
        }) {
            Ok(p) | Err(p) => p,
        };
        let granted = requested.min(prev);
        Reservation {
            granted,
            exhausted: prev - granted == 0,
        }
    }
}
