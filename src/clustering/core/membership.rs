//! Posterior membership matrix and hard-assignment derivation.
//!
//! Purpose
//! -------
//! Wrap the N×K matrix of posterior cluster probabilities
//! `P(cluster_i | example_j)` produced by every Expectation step, enforce
//! the row-stochastic convention at one place, and derive the discrete
//! per-example assignment vector from it.
//!
//! Key behaviors
//! -------------
//! - [`Membership::normalize_rows`] divides each row by its sum; rows whose
//!   sum is exactly zero (total density underflow) are left at zero and
//!   resolved later by the random tie-break in hard assignment.
//! - [`Membership::hard_assignments`] takes the per-row arg-max; ties and
//!   all-zero rows are broken by a uniformly random choice among the tied
//!   maxima (for a zero row, all K clusters tie at zero), drawn from the
//!   threaded RNG so assignment stays reproducible under a fixed seed.
//!
//! Invariants & assumptions
//! ------------------------
//! - After `normalize_rows`, every row with positive mass sums to 1 within
//!   floating tolerance.
//! - The matrix is reallocated fresh at the start of each run and mutated
//!   in place during Expectation passes; it is never shared across runs.

use ndarray::{Array1, Array2, ArrayView2};
use rand::{rngs::StdRng, Rng};

/// Membership — N×K row-stochastic posterior matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    probs: Array2<f64>,
}

impl Membership {
    /// An all-zero N×K matrix, filled in by the next Expectation pass.
    pub fn zeros(n_examples: usize, k: usize) -> Self {
        Membership { probs: Array2::zeros((n_examples, k)) }
    }

    /// Build a 0/1 membership matrix from a hard partition.
    ///
    /// Used by the initializers: each example contributes full weight to
    /// its assigned cluster. `partition` values must lie in `0..k`.
    pub fn from_partition(partition: &Array1<usize>, k: usize) -> Self {
        let mut probs = Array2::zeros((partition.len(), k));
        for (example, &cluster) in partition.iter().enumerate() {
            probs[(example, cluster)] = 1.0;
        }
        Membership { probs }
    }

    /// Number of examples (rows).
    pub fn n_examples(&self) -> usize {
        self.probs.nrows()
    }

    /// Number of clusters (columns).
    pub fn k(&self) -> usize {
        self.probs.ncols()
    }

    /// Read-only view of the probabilities.
    pub fn probs(&self) -> ArrayView2<'_, f64> {
        self.probs.view()
    }

    /// Posterior probability of `cluster` for `example`.
    pub fn prob(&self, example: usize, cluster: usize) -> f64 {
        self.probs[(example, cluster)]
    }

    /// Overwrite one row with unnormalized weights.
    pub fn set_row(&mut self, example: usize, weights: &[f64]) {
        for (cluster, &w) in weights.iter().enumerate() {
            self.probs[(example, cluster)] = w;
        }
    }

    /// Divide each row by its sum; zero-sum rows are left untouched.
    pub fn normalize_rows(&mut self) {
        for mut row in self.probs.rows_mut() {
            let sum: f64 = row.sum();
            if sum > 0.0 {
                row /= sum;
            }
        }
    }

    /// Consume the wrapper and return the owned matrix.
    pub fn into_inner(self) -> Array2<f64> {
        self.probs
    }

    /// Hard per-example cluster assignment.
    ///
    /// Each example maps to its arg-max cluster; when several clusters tie
    /// at the row maximum (including the all-zero row, where every cluster
    /// ties at 0), one of the tied clusters is chosen uniformly at random
    /// from `rng`. The result is therefore never undefined.
    pub fn hard_assignments(&self, rng: &mut StdRng) -> Array1<usize> {
        let k = self.k();
        let mut assignment = Array1::zeros(self.n_examples());
        let mut tied: Vec<usize> = Vec::with_capacity(k);

        for (example, row) in self.probs.rows().into_iter().enumerate() {
            let mut best = f64::NEG_INFINITY;
            tied.clear();
            for (cluster, &p) in row.iter().enumerate() {
                if p > best {
                    best = p;
                    tied.clear();
                    tied.push(cluster);
                } else if p == best {
                    tied.push(cluster);
                }
            }
            assignment[example] = if tied.len() == 1 {
                tied[0]
            } else {
                tied[rng.gen_range(0..tied.len())]
            };
        }
        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Row normalization, including the zero-sum row exception.
    // - Hard assignment for unique maxima, tied maxima, and all-zero rows.
    // - Construction from a hard partition.
    //
    // They intentionally DO NOT cover Expectation-step density math (covered
    // by the model-internals tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `normalize_rows` makes positive-mass rows sum to 1 and
    // leaves zero rows untouched.
    //
    // Given
    // -----
    // - A 3×2 matrix with one ordinary row, one unnormalized row, and one
    //   all-zero row.
    //
    // Expect
    // ------
    // - Rows 0 and 1 sum to 1 within 1e-12; row 2 stays all-zero.
    fn normalize_rows_makes_positive_rows_stochastic_and_keeps_zero_rows() {
        // Arrange
        let mut membership = Membership { probs: array![[0.2, 0.2], [3.0, 1.0], [0.0, 0.0]] };

        // Act
        membership.normalize_rows();

        // Assert
        let probs = membership.probs();
        assert!((probs.row(0).sum() - 1.0).abs() < 1e-12);
        assert!((probs.row(1).sum() - 1.0).abs() < 1e-12);
        assert_eq!(probs[(1, 0)], 0.75);
        assert_eq!(probs.row(2).sum(), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify that hard assignment picks the unique arg-max without touching
    // the RNG-dependent tie path.
    //
    // Given
    // -----
    // - Rows with strict maxima in different columns.
    //
    // Expect
    // ------
    // - The assignment matches the arg-max of every row.
    fn hard_assignments_pick_unique_argmax() {
        // Arrange
        let membership = Membership { probs: array![[0.9, 0.1], [0.3, 0.7], [0.6, 0.4]] };
        let mut rng = StdRng::seed_from_u64(0);

        // Act
        let assignment = membership.hard_assignments(&mut rng);

        // Assert
        assert_eq!(assignment, array![0, 1, 0]);
    }

    #[test]
    // Purpose
    // -------
    // Verify that tied and all-zero rows resolve to one of the tied
    // clusters, uniformly at random but reproducibly under a fixed seed.
    //
    // Given
    // -----
    // - A row tied between clusters 0 and 2, and an all-zero row; two RNGs
    //   with the same seed.
    //
    // Expect
    // ------
    // - Tied row resolves to cluster 0 or 2 (never 1); the zero row resolves
    //   to some cluster in range; both draws are identical across the two
    //   seeded RNGs.
    fn hard_assignments_break_ties_and_zero_rows_randomly_but_reproducibly() {
        // Arrange
        let membership =
            Membership { probs: array![[0.5, 0.0, 0.5], [0.0, 0.0, 0.0]] };
        let mut rng_a = StdRng::seed_from_u64(123);
        let mut rng_b = StdRng::seed_from_u64(123);

        // Act
        let a = membership.hard_assignments(&mut rng_a);
        let b = membership.hard_assignments(&mut rng_b);

        // Assert
        assert!(a[0] == 0 || a[0] == 2, "tied row must resolve to a tied cluster, got {}", a[0]);
        assert!(a[1] < 3, "zero row must resolve to a valid cluster");
        assert_eq!(a, b, "same seed must give the same tie resolution");
    }

    #[test]
    // Purpose
    // -------
    // Verify construction from a hard partition.
    //
    // Given
    // -----
    // - Partition [1, 0, 1] with k = 2.
    //
    // Expect
    // ------
    // - A 3×2 0/1 matrix with exactly one 1 per row at the partition index.
    fn from_partition_builds_one_hot_rows() {
        // Arrange
        let partition = array![1_usize, 0, 1];

        // Act
        let membership = Membership::from_partition(&partition, 2);

        // Assert
        assert_eq!(membership.probs(), array![[0.0, 1.0], [1.0, 0.0], [0.0, 1.0]].view());
    }
}
