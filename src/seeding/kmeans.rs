//! Deterministic k-means hard partitioner used to seed EM initialization.
//!
//! Purpose
//! -------
//! Produce a hard K-way partition of the dataset for the seeded-by-clustering
//! initialization strategy: k-means++-style center seeding from the threaded
//! RNG, Lloyd iterations under a configurable [`DistanceMeasure`], and a
//! repair pass that guarantees every cluster ends up non-empty (the EM
//! initializer divides by per-cluster counts).
//!
//! Key behaviors
//! -------------
//! - All randomness (first center, weighted center sampling) comes from the
//!   caller's RNG; a fixed seed yields a bit-identical partition.
//! - Nearest-center ties break toward the lower cluster index, so assignment
//!   is order-stable.
//! - Empty clusters are repaired by stealing the example farthest from its
//!   assigned center out of a cluster that still has at least two members.
//!
//! Invariants & assumptions
//! ------------------------
//! - The caller has already validated `k >= 1` and `n >= k` (the EM fit
//!   checks the dataset-vs-k precondition before seeding).
//! - Returned partition indices are in `0..k` and every cluster index occurs
//!   at least once.

use crate::{
    clustering::{core::data::ClusterData, errors::ClusterResult},
    seeding::distance::DistanceMeasure,
};
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng};

/// Hard K-way partition of `data` via seeded k-means.
///
/// Parameters
/// ----------
/// - `data`: validated dataset to partition.
/// - `k`: number of clusters; the caller guarantees `1 <= k <= n`.
/// - `measure`: distance used for seeding and assignment.
/// - `max_iterations`: Lloyd iteration cap; the loop also stops early when
///   centers stop moving.
/// - `rng`: explicitly threaded random source.
///
/// Returns
/// -------
/// A length-N assignment vector with every cluster index in `0..k` occupied.
pub fn kmeans_partition(
    data: &ClusterData, k: usize, measure: DistanceMeasure, max_iterations: usize,
    rng: &mut StdRng,
) -> ClusterResult<Array1<usize>> {
    let n = data.n_examples();
    let d = data.n_features();

    // k-means++ seeding: first center by seeded pick, the rest by weighted
    // sampling on squared distance to the nearest chosen center.
    let first = rng.gen_range(0..n);
    let mut centers = Array2::<f64>::zeros((k, d));
    centers.row_mut(0).assign(&data.row(first));
    let mut nearest = vec![f64::INFINITY; n];

    for next_center in 1..k {
        let last = centers.row(next_center - 1);
        for i in 0..n {
            let dist = measure.distance(data.row(i), last);
            if dist < nearest[i] {
                nearest[i] = dist;
            }
        }
        let total: f64 = nearest.iter().map(|&dist| dist * dist).sum();
        let chosen = if total > 0.0 {
            let mut r = rng.gen::<f64>() * total;
            let mut idx = n - 1;
            for (i, &dist) in nearest.iter().enumerate() {
                let w = dist * dist;
                if r <= w {
                    idx = i;
                    break;
                }
                r -= w;
            }
            idx
        } else {
            // All remaining mass is zero (duplicated points); fall back to a
            // uniform pick so seeding still terminates.
            rng.gen_range(0..n)
        };
        centers.row_mut(next_center).assign(&data.row(chosen));
    }

    // Lloyd iterations with index-stable tie-breaks.
    let mut assignment = Array1::<usize>::zeros(n);
    for _ in 0..max_iterations {
        for i in 0..n {
            assignment[i] = nearest_center(data, &centers, i, measure);
        }

        let mut new_centers = Array2::<f64>::zeros((k, d));
        let mut counts = vec![0_usize; k];
        for i in 0..n {
            let c = assignment[i];
            counts[c] += 1;
            let mut row = new_centers.row_mut(c);
            row += &data.row(i);
        }
        for c in 0..k {
            if counts[c] > 0 {
                let mut row = new_centers.row_mut(c);
                row /= counts[c] as f64;
            } else {
                // Empty cluster: re-seed its center to a deterministic example.
                new_centers.row_mut(c).assign(&data.row(c % n));
            }
        }

        let moved = centers
            .iter()
            .zip(new_centers.iter())
            .any(|(&a, &b)| (a - b).abs() > 1e-9);
        centers = new_centers;
        if !moved {
            break;
        }
    }

    // Final assignment against the last centers, then repair empties.
    for i in 0..n {
        assignment[i] = nearest_center(data, &centers, i, measure);
    }
    repair_empty_clusters(data, &centers, &mut assignment, k, measure);

    Ok(assignment)
}

// ---- Helper methods ----

fn nearest_center(
    data: &ClusterData, centers: &Array2<f64>, example: usize, measure: DistanceMeasure,
) -> usize {
    let mut best_c = 0_usize;
    let mut best_d = f64::INFINITY;
    for (c, center) in centers.outer_iter().enumerate() {
        let dist = measure.distance(data.row(example), center);
        if dist < best_d {
            best_d = dist;
            best_c = c;
        }
    }
    best_c
}

/// Move examples into empty clusters until every cluster index occurs at
/// least once. Each pass steals the example farthest from its assigned
/// center out of a cluster that still has two or more members, so the donor
/// never becomes empty itself. Terminates because `n >= k`.
fn repair_empty_clusters(
    data: &ClusterData, centers: &Array2<f64>, assignment: &mut Array1<usize>, k: usize,
    measure: DistanceMeasure,
) {
    let n = data.n_examples();
    loop {
        let mut counts = vec![0_usize; k];
        for &c in assignment.iter() {
            counts[c] += 1;
        }
        let Some(empty) = counts.iter().position(|&count| count == 0) else {
            return;
        };

        let mut donor = None;
        let mut worst = -1.0_f64;
        for i in 0..n {
            let c = assignment[i];
            if counts[c] < 2 {
                continue;
            }
            let dist = measure.distance(data.row(i), centers.row(c));
            if dist > worst {
                worst = dist;
                donor = Some(i);
            }
        }
        // n >= k guarantees some cluster has two or more members whenever
        // another is empty.
        if let Some(i) = donor {
            assignment[i] = empty;
        } else {
            return;
        }
    }
}
