//! Initialization strategies for EM mixture fitting — control how the
//! starting membership and mixture parameters are produced.
//!
//! Purpose
//! -------
//! Provide the small closed set of initialization policies an EM fit can
//! start from. Centralizing the policy choice here keeps the run controller
//! free of configuration details: it selects a strategy once per run and
//! dispatches to the matching initializer in the model internals.
//!
//! Key behaviors
//! -------------
//! - Represent initialization as an explicit policy via [`InitStrategy`]:
//!   random assignment, seeding from a k-means hard partition, or
//!   average-parameter spreading.
//! - Validate the seeded-by-clustering configuration (iteration cap) at
//!   construction time, surfacing bad inputs as typed errors instead of
//!   panicking.
//!
//! Invariants & assumptions
//! ------------------------
//! - Exactly one strategy is active per fit; all runs of a fit share it.
//! - The strategies themselves are abstract policies; the numeric work
//!   happens in `clustering::models::em_internals` once data and an RNG are
//!   available.
//!
//! Conventions
//! -----------
//! - Pattern matches on [`InitStrategy`] in the initializer are exhaustive,
//!   so adding a policy triggers compiler errors at every dispatch site.
//!
//! Testing notes
//! -------------
//! - Unit tests here cover constructor validation only; the numeric
//!   behavior of each strategy is tested with the model internals.

use crate::{
    clustering::errors::{ClusterError, ClusterResult},
    seeding::distance::DistanceMeasure,
};

/// Default Lloyd-iteration cap for seeded-by-clustering initialization.
pub const DEFAULT_KMEANS_ITERATIONS: usize = 100;

/// InitStrategy — policies for producing the starting mixture model.
///
/// Variants
/// --------
/// - `RandomAssignment`
///   Assign each example to a uniformly random cluster, retrying until every
///   cluster receives at least one example; derive means, priors, and
///   variances from the resulting hard partition.
/// - `SeededByClustering { measure, max_iterations }`
///   Obtain a hard K-way partition from the k-means seeder under the given
///   distance measure, then derive parameters exactly as the random
///   strategy does.
/// - `AverageParameters`
///   Spread K means evenly between the per-feature minimum and average and
///   between the average and maximum, after perturbing the grid by a random
///   offset scaled to range/(2K); equal priors and spacing-derived
///   variances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitStrategy {
    RandomAssignment,
    SeededByClustering { measure: DistanceMeasure, max_iterations: usize },
    AverageParameters,
}

impl InitStrategy {
    /// Random-assignment initialization.
    pub const fn random_assignment() -> Self {
        InitStrategy::RandomAssignment
    }

    /// Average-parameters initialization.
    pub const fn average_parameters() -> Self {
        InitStrategy::AverageParameters
    }

    /// Seeded-by-clustering initialization with the default iteration cap.
    ///
    /// # Errors
    /// Never fails; the default cap is valid by construction.
    pub const fn seeded_by_clustering(measure: DistanceMeasure) -> Self {
        InitStrategy::SeededByClustering { measure, max_iterations: DEFAULT_KMEANS_ITERATIONS }
    }

    /// Seeded-by-clustering initialization with an explicit iteration cap.
    ///
    /// # Errors
    /// Returns [`ClusterError::InvalidKMeansIterations`] if `max_iterations`
    /// is zero.
    pub fn seeded_by_clustering_with_iterations(
        measure: DistanceMeasure, max_iterations: usize,
    ) -> ClusterResult<Self> {
        if max_iterations == 0 {
            return Err(ClusterError::InvalidKMeansIterations { value: max_iterations });
        }
        Ok(InitStrategy::SeededByClustering { measure, max_iterations })
    }
}
