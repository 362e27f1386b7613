// src/ingest/latch.rs
//! At-most-once close signal shared by all fetch workers.

use std::sync::atomic::{AtomicUsize, Ordering};

const OPEN: usize = usize::MAX;

/// Records which worker closed the pipeline. Only the first `close` wins.
#[derive(Debug)]
pub struct CloseLatch {
    closed_by: AtomicUsize,
}

impl Default for CloseLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CloseLatch {
    pub fn new() -> Self {
        Self {
            closed_by: AtomicUsize::new(OPEN),
        }
    }

    /// Returns `true` only for the call that performed the transition.
    pub fn close(&self, worker: usize) -> bool {
        debug_assert_ne!(worker, OPEN);
        self.closed_by
            .compare_exchange(OPEN, worker, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closed_by.load(Ordering::Acquire) != OPEN
    }

    pub fn closed_by(&self) -> Option<usize> {
        match self.closed_by.load(Ordering::Acquire) {
            OPEN => None,
            w => Some(w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_close_wins() {
        let l = CloseLatch::new();
        assert!(!l.is_closed());
        assert!(l.close(3));
        assert!(!l.close(1));
        assert_eq!(l.closed_by(), Some(3));
    }

    #[test]
    fn concurrent_close_transitions_once() {
        let latch = Arc::new(CloseLatch::new());
        let winners: usize = (0..16)
            .map(|w| {
                let l = Arc::clone(&latch);
                std::thread::spawn(move || l.close(w))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(winners, 1);
        assert!(latch.closed_by().is_some());
    }
}
