//! Per-run scratch arena for the E/M loop.
//!
//! Purpose
//! -------
//! Own the accumulator buffers a single run needs — the K×D weighted-sum
//! matrix and the length-K weight vector used by every Maximization pass —
//! so the inner loops never allocate. The arena is allocated once at the
//! start of a run, reset in place between passes, and never aliased across
//! runs.
//!
//! Key behaviors
//! -------------
//! - [`RunWorkspace::reset`] zeroes both accumulators without reallocating.
//! - Accumulation is plain indexed arithmetic on owned buffers; there is no
//!   borrowing across iterations and no shared state between runs.
//!
//! Conventions
//! -----------
//! - `weighted_sums[(cluster, feature)]` accumulates
//!   `Σ_j membership[j][cluster] · x[j][feature]`.
//! - `weights[cluster]` accumulates `Σ_j membership[j][cluster]`.
//! - This type is purely numeric; it performs no I/O and emits no logging.

use ndarray::{Array1, Array2};

/// RunWorkspace — owned accumulators for one run's Maximization passes.
///
/// Fields
/// ------
/// - `weighted_sums`: K×D membership-weighted feature sums.
/// - `weights`: length-K total membership mass per cluster.
///
/// Invariants
/// ----------
/// - Shapes are fixed at construction (`k` × `n_features` and `k`); `reset`
///   never changes them.
#[derive(Debug)]
pub struct RunWorkspace {
    pub weighted_sums: Array2<f64>,
    pub weights: Array1<f64>,
}

impl RunWorkspace {
    /// Allocate a zeroed arena for `k` clusters over `n_features` features.
    pub fn new(k: usize, n_features: usize) -> Self {
        RunWorkspace {
            weighted_sums: Array2::zeros((k, n_features)),
            weights: Array1::zeros(k),
        }
    }

    /// Zero both accumulators in place.
    pub fn reset(&mut self) {
        self.weighted_sums.fill(0.0);
        self.weights.fill(0.0);
    }
}
