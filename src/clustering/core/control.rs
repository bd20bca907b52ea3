//! Cooperative cancellation and progress reporting for the run controller.
//!
//! Purpose
//! -------
//! The fit is single-threaded, synchronous, and CPU-bound; there is no
//! timeout machinery beyond the configured run/step budgets. Cancellation
//! is therefore cooperative: the per-example and per-run loops poll a
//! [`StopToken`] and abort cleanly with `ClusterError::Cancelled` instead
//! of delivering a result. Progress is reported through a caller-supplied
//! [`ProgressReporter`], whose total is rebased when the covariance
//! fallback extends the outer loop.
//!
//! Conventions
//! -----------
//! - The token is polled at loop-iteration granularity: at minimum once per
//!   example scanned during an Expectation or Maximization pass and once
//!   per run.
//! - Counters move monotonically within one phase; the only discontinuity
//!   is the documented rebase after the fallback restart.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// StopToken — cloneable cooperative-cancellation flag.
///
/// One side calls [`StopToken::cancel`]; the computing side polls
/// [`StopToken::is_cancelled`] and aborts with `ClusterError::Cancelled`.
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        StopToken::default()
    }

    /// Request cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// ProgressReporter — observer for outer-loop progress.
///
/// `report(completed, total)` is invoked after every finished or failed
/// run. `total` starts at the configured run budget and is rebased upward
/// (extended) when the covariance fallback restarts the outer loop, so
/// `completed` never exceeds `total`.
pub trait ProgressReporter {
    fn report(&mut self, completed: usize, total: usize);
}

/// No-op reporter used when the caller does not track progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _completed: usize, _total: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Token sharing semantics. The polling sites themselves are exercised by
    // the run-controller cancellation test.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that clones of a `StopToken` share one flag.
    //
    // Given
    // -----
    // - A token and a clone taken before cancellation.
    //
    // Expect
    // ------
    // - Cancelling through the clone is visible through the original.
    fn stop_token_clones_share_the_flag() {
        // Arrange
        let token = StopToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());

        // Act
        clone.cancel();

        // Assert
        assert!(token.is_cancelled());
    }
}
