//! Distance measures for k-means seeding.
//!
//! Purpose
//! -------
//! Provide the small closed set of distance measures that the
//! seeded-by-clustering initialization strategy can hand to the k-means
//! partitioner. The EM core itself never computes distances through this
//! module; it exists purely at the seeding boundary.
//!
//! Conventions
//! -----------
//! - All measures operate on equal-length `f64` views; length agreement is
//!   the caller's responsibility (both vectors come from the same validated
//!   dataset).
//! - `SquaredEuclidean` omits the square root; for nearest-center queries it
//!   ranks identically to `Euclidean` and is the cheaper default.

use ndarray::ArrayView1;

/// DistanceMeasure — closed set of distances usable for k-means seeding.
///
/// Variants
/// --------
/// - `Euclidean`: `sqrt(Σ (aᵢ − bᵢ)²)`.
/// - `SquaredEuclidean`: `Σ (aᵢ − bᵢ)²` (rank-equivalent to Euclidean).
/// - `Manhattan`: `Σ |aᵢ − bᵢ|`.
/// - `Chebyshev`: `max |aᵢ − bᵢ|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMeasure {
    Euclidean,
    SquaredEuclidean,
    Manhattan,
    Chebyshev,
}

impl DistanceMeasure {
    /// Distance between two equal-length vectors under this measure.
    pub fn distance(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        match self {
            DistanceMeasure::Euclidean => squared_euclidean(a, b).sqrt(),
            DistanceMeasure::SquaredEuclidean => squared_euclidean(a, b),
            DistanceMeasure::Manhattan => {
                a.iter().zip(b.iter()).map(|(&x, &y)| (x - y).abs()).sum()
            }
            DistanceMeasure::Chebyshev => a
                .iter()
                .zip(b.iter())
                .map(|(&x, &y)| (x - y).abs())
                .fold(0.0_f64, f64::max),
        }
    }
}

fn squared_euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
