//! Mixture-model containers: means, mixing priors, and the covariance
//! representation.
//!
//! Purpose
//! -------
//! Hold the parameters of a K-component Gaussian mixture over D features.
//! Exactly one covariance representation is active per model instance —
//! one scalar variance per cluster ("non-correlated" mode) or one full
//! D×D covariance matrix per cluster ("correlated" mode) — selected at
//! initialization time and fixed for the run.
//!
//! Key behaviors
//! -------------
//! - Models are plain data: the E/M passes in the model internals create a
//!   fresh instance per iteration and the previous one is retained only as
//!   the "old model" for the next Expectation step.
//! - [`CovarianceModel`] is a closed sum type so every density computation
//!   must handle both representations exhaustively.
//!
//! Conventions
//! -----------
//! - `means` is K×D (one row per cluster); `priors` has length K and sums
//!   to 1 across clusters.
//! - Spherical variances follow the M-step convention of this crate: the
//!   membership-weighted mean of full squared Euclidean deviations, with
//!   no division by the feature count. The density evaluation uses the
//!   same scalar, so the two stay internally consistent.
//! - Full covariances are stored as `nalgebra::DMatrix` values because the
//!   Expectation step needs their inverses and determinants.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Variance floor substituted for an exactly zero scalar variance during
/// density evaluation.
pub const VARIANCE_EPSILON: f64 = 1e-10;

/// CovarianceModel — the two covariance representations of a mixture.
///
/// Variants
/// --------
/// - `Spherical(Array1<f64>)`: one scalar variance per cluster (length K).
/// - `Full(Vec<DMatrix<f64>>)`: one D×D covariance matrix per cluster
///   (length K).
#[derive(Debug, Clone, PartialEq)]
pub enum CovarianceModel {
    Spherical(Array1<f64>),
    Full(Vec<DMatrix<f64>>),
}

impl CovarianceModel {
    /// Whether this model carries full covariance matrices.
    pub fn is_correlated(&self) -> bool {
        matches!(self, CovarianceModel::Full(_))
    }

    /// Number of clusters covered by this representation.
    pub fn n_clusters(&self) -> usize {
        match self {
            CovarianceModel::Spherical(variances) => variances.len(),
            CovarianceModel::Full(matrices) => matrices.len(),
        }
    }
}

/// MixtureModel — parameters of a K-component Gaussian mixture.
///
/// Fields
/// ------
/// - `means`: K×D matrix, one mean vector per cluster.
/// - `priors`: length-K mixing probabilities, summing to 1.
/// - `covariance`: the active [`CovarianceModel`] representation.
///
/// Invariants
/// ----------
/// - `means.nrows() == priors.len() == covariance.n_clusters()`.
/// - All parameters finite; priors non-negative and summing to 1 up to
///   floating tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureModel {
    pub means: Array2<f64>,
    pub priors: Array1<f64>,
    pub covariance: CovarianceModel,
}

impl MixtureModel {
    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.priors.len()
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.means.ncols()
    }
}
