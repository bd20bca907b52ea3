//! Errors for EM mixture-model clustering (data validation, option checks,
//! numerical failures, and terminal fitting failures).
//!
//! This module defines a single error type, [`ClusterError`], used across the
//! public API and the internal fitting core.
//!
//! ## Conventions
//! - **Indices are 0-based** (rows = examples, columns = features).
//! - Datasets must contain only finite values; a non-finite cell is treated
//!   as a missing value and rejected before any computation.
//! - Numerical variants (`SingularCovariance`, `NonFiniteLogLikelihood`)
//!   are recoverable at the run level: the run controller discards the
//!   failing run wholesale and retries. Every other variant propagates to
//!   the caller.

/// Crate-wide result alias for clustering operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Unified error type for EM mixture-model clustering.
///
/// Variants cover input/data validation, option checks, run-level numerical
/// failures, cooperative cancellation, and the terminal "no model computed"
/// failure. The error implements `Display` and `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterError {
    // ---- Input/data validation ----
    /// Dataset has no examples.
    EmptyDataset,

    /// Dataset has no feature columns.
    NoFeatures,

    /// A cell is NaN/±inf (missing values are rejected before fitting).
    NonFiniteValue { row: usize, col: usize, value: f64 },

    /// Fewer examples than requested clusters.
    TooFewExamples { examples: usize, k: usize },

    // ---- Options validation ----
    /// Cluster count must be ≥ 2.
    InvalidK { k: usize },

    /// Outer restart budget must be ≥ 1.
    InvalidMaxRuns { value: usize },

    /// Per-run E/M iteration cap must be ≥ 1.
    InvalidMaxSteps { value: usize },

    /// Convergence threshold must be finite and > 0.
    InvalidQuality { value: f64 },

    /// k-means seeding iteration cap must be ≥ 1.
    InvalidKMeansIterations { value: usize },

    // ---- Numerical failures (recoverable at the run level) ----
    /// A cluster covariance matrix could not be inverted or has a
    /// non-positive determinant.
    SingularCovariance { cluster: usize },

    /// The log-likelihood evaluated to NaN or ±inf.
    NonFiniteLogLikelihood { value: f64 },

    // ---- Control flow ----
    /// The fit was aborted through a `StopToken`.
    Cancelled,

    // ---- Terminal fitting failure ----
    /// No run across the (possibly extended) budget produced a usable model.
    NoModelComputed { attempted_runs: usize },
}

impl std::error::Error for ClusterError {}

impl std::fmt::Display for ClusterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterError::EmptyDataset => {
                write!(f, "Dataset contains no examples.")
            }
            ClusterError::NoFeatures => {
                write!(f, "Dataset contains no feature columns.")
            }
            ClusterError::NonFiniteValue { row, col, value } => {
                write!(f, "Value at row {row}, column {col} is non-finite: {value}")
            }
            ClusterError::TooFewExamples { examples, k } => {
                write!(f, "Dataset has {examples} examples but {k} clusters were requested.")
            }
            ClusterError::InvalidK { k } => {
                write!(f, "Cluster count must be >= 2; got: {k}")
            }
            ClusterError::InvalidMaxRuns { value } => {
                write!(f, "max_runs must be >= 1; got: {value}")
            }
            ClusterError::InvalidMaxSteps { value } => {
                write!(f, "max_optimization_steps must be >= 1; got: {value}")
            }
            ClusterError::InvalidQuality { value } => {
                write!(f, "quality must be finite and > 0; got: {value}")
            }
            ClusterError::InvalidKMeansIterations { value } => {
                write!(f, "k-means max_iterations must be >= 1; got: {value}")
            }
            ClusterError::SingularCovariance { cluster } => {
                write!(f, "Covariance matrix of cluster {cluster} is singular or degenerate.")
            }
            ClusterError::NonFiniteLogLikelihood { value } => {
                write!(f, "Log-likelihood evaluated to a non-finite value: {value}")
            }
            ClusterError::Cancelled => {
                write!(f, "Clustering was cancelled before completion.")
            }
            ClusterError::NoModelComputed { attempted_runs } => {
                write!(f, "No usable mixture model was computed after {attempted_runs} runs.")
            }
        }
    }
}

impl ClusterError {
    /// Whether the run controller may recover from this error by discarding
    /// the current run and retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClusterError::SingularCovariance { .. } | ClusterError::NonFiniteLogLikelihood { .. }
        )
    }
}
