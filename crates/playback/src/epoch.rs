//! Stale-timer guard.
//!
//! Every clock tick, ramp step, and fetch completion is tagged with the
//! epoch it was spawned under. Loading a new date range or parameter
//! advances the epoch, so callbacks from superseded timers observe a
//! mismatch and drop their write instead of mutating state that belongs to
//! a fresher load.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of one load generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epoch(u64);

/// Shared monotonic epoch counter.
#[derive(Debug, Clone, Default)]
pub struct EpochGuard {
    current: Arc<AtomicU64>,
}

impl EpochGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch the guard is currently on.
    pub fn current(&self) -> Epoch {
        Epoch(self.current.load(Ordering::Acquire))
    }

    /// Invalidate all outstanding work and return the new epoch.
    pub fn advance(&self) -> Epoch {
        Epoch(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether work tagged with `epoch` may still write.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current() == epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_invalidates_prior_epoch() {
        let guard = EpochGuard::new();
        let first = guard.current();
        assert!(guard.is_current(first));

        let second = guard.advance();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
        assert_ne!(first, second);
    }

    #[test]
    fn test_clones_share_the_counter() {
        let guard = EpochGuard::new();
        let other = guard.clone();
        let epoch = guard.current();

        other.advance();
        assert!(!guard.is_current(epoch));
    }
}
