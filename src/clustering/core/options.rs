//! Fit configuration for EM mixture clustering.
//!
//! Purpose
//! -------
//! Bundle the validated knobs of a fit — cluster count, run and step
//! budgets, convergence threshold, initialization strategy, covariance
//! representation, output preferences, and the optional random seed — into
//! a single [`EMOptions`] value constructed once and shared by every run.
//!
//! Key behaviors
//! -------------
//! - Validate every bound at construction time through the shared
//!   validators; a successfully constructed `EMOptions` needs no further
//!   checking downstream.
//! - Keep the covariance representation (`correlated_attributes`) a plain
//!   flag here; the run controller owns the one-time fallback that may
//!   clear it mid-fit.
//!
//! Conventions
//! -----------
//! - `random_seed: Some(s)` makes the whole fit bit-reproducible;
//!   `None` seeds the generator from OS entropy.
//! - `show_probabilities` only controls whether the winning run's
//!   membership matrix is retained in the outcome; it never changes the
//!   fitted model.

use crate::clustering::{
    core::{
        init::InitStrategy,
        validation::{validate_k, validate_max_runs, validate_max_steps, validate_quality},
    },
    errors::ClusterResult,
};

/// EMOptions — validated configuration for one EM clustering fit.
///
/// Fields
/// ------
/// - `k`: number of clusters, ≥ 2.
/// - `max_runs`: outer restart budget, ≥ 1.
/// - `max_optimization_steps`: per-run E/M iteration cap, ≥ 1.
/// - `quality`: convergence threshold on |Δ log-likelihood|, finite and > 0
///   (recommended roughly `1e-15..=1e-1`).
/// - `init`: initialization strategy, fixed for the whole fit.
/// - `correlated_attributes`: full covariance matrices when `true`, one
///   scalar variance per cluster when `false`.
/// - `show_probabilities`: retain the winning run's membership matrix in
///   the outcome.
/// - `random_seed`: deterministic reproducibility when `Some`.
///
/// Invariants
/// ----------
/// - All bounds above hold for every constructed instance; the constructor
///   is the only way to build one.
#[derive(Debug, Clone, PartialEq)]
pub struct EMOptions {
    pub k: usize,
    pub max_runs: usize,
    pub max_optimization_steps: usize,
    pub quality: f64,
    pub init: InitStrategy,
    pub correlated_attributes: bool,
    pub show_probabilities: bool,
    pub random_seed: Option<u64>,
}

impl EMOptions {
    /// Construct a validated [`EMOptions`] instance.
    ///
    /// # Errors
    /// Returns the matching `ClusterError` variant if `k < 2`,
    /// `max_runs == 0`, `max_optimization_steps == 0`, or `quality` is
    /// non-finite or non-positive.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        k: usize, max_runs: usize, max_optimization_steps: usize, quality: f64,
        init: InitStrategy, correlated_attributes: bool, show_probabilities: bool,
        random_seed: Option<u64>,
    ) -> ClusterResult<Self> {
        Ok(EMOptions {
            k: validate_k(k)?,
            max_runs: validate_max_runs(max_runs)?,
            max_optimization_steps: validate_max_steps(max_optimization_steps)?,
            quality: validate_quality(quality)?,
            init,
            correlated_attributes,
            show_probabilities,
            random_seed,
        })
    }

    /// Common defaults around a chosen `k`: 5 runs, 100 steps per run,
    /// quality `1e-10`, random-assignment initialization, scalar variances,
    /// no probability table, entropy seeding.
    ///
    /// # Errors
    /// Returns `ClusterError::InvalidK` if `k < 2`.
    pub fn with_k(k: usize) -> ClusterResult<Self> {
        EMOptions::new(k, 5, 100, 1e-10, InitStrategy::random_assignment(), false, false, None)
    }
}
