//! Shared validators for fit configuration and dataset preconditions.
//!
//! Centralizes the bound checks used by [`EMOptions`] construction and by
//! the run controller before any computation starts, so every entry point
//! rejects the same inputs with the same [`ClusterError`] variants.
//!
//! [`EMOptions`]: crate::clustering::core::options::EMOptions

use crate::clustering::{
    core::data::ClusterData,
    errors::{ClusterError, ClusterResult},
};

/// Validate the cluster count.
///
/// # Errors
/// Returns [`ClusterError::InvalidK`] if `k < 2`.
pub fn validate_k(k: usize) -> ClusterResult<usize> {
    if k < 2 {
        return Err(ClusterError::InvalidK { k });
    }
    Ok(k)
}

/// Validate the outer restart budget.
///
/// # Errors
/// Returns [`ClusterError::InvalidMaxRuns`] if `max_runs == 0`.
pub fn validate_max_runs(max_runs: usize) -> ClusterResult<usize> {
    if max_runs == 0 {
        return Err(ClusterError::InvalidMaxRuns { value: max_runs });
    }
    Ok(max_runs)
}

/// Validate the per-run E/M step cap.
///
/// # Errors
/// Returns [`ClusterError::InvalidMaxSteps`] if `max_steps == 0`.
pub fn validate_max_steps(max_steps: usize) -> ClusterResult<usize> {
    if max_steps == 0 {
        return Err(ClusterError::InvalidMaxSteps { value: max_steps });
    }
    Ok(max_steps)
}

/// Validate the convergence threshold on |Δ log-likelihood|.
///
/// The recommended range is roughly `1e-15..=1e-1`; only finiteness and
/// strict positivity are enforced.
///
/// # Errors
/// Returns [`ClusterError::InvalidQuality`] if `quality` is non-finite or
/// `<= 0.0`.
pub fn validate_quality(quality: f64) -> ClusterResult<f64> {
    if !quality.is_finite() || quality <= 0.0 {
        return Err(ClusterError::InvalidQuality { value: quality });
    }
    Ok(quality)
}

/// Validate the dataset-vs-k precondition before any run starts.
///
/// # Errors
/// Returns [`ClusterError::TooFewExamples`] if the dataset holds fewer
/// examples than the requested cluster count.
pub fn validate_dataset_for_k(data: &ClusterData, k: usize) -> ClusterResult<()> {
    if data.n_examples() < k {
        return Err(ClusterError::TooFewExamples { examples: data.n_examples(), k });
    }
    Ok(())
}
