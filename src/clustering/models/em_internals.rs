//! EM numeric internals — initializers, Expectation/Maximization passes,
//! and the log-likelihood criterion.
//!
//! Purpose
//! -------
//! Provide the pure numeric building blocks the run controller alternates:
//! producing a starting `(Membership, MixtureModel)` pair under the
//! configured [`InitStrategy`], the two Expectation variants (scalar
//! variance vs full covariance), the Maximization update, and the
//! log-likelihood used for convergence detection.
//!
//! Key behaviors
//! -------------
//! - Every function is pure on `(data, model, workspace, rng)`: no hidden
//!   state, no I/O, no logging. A fresh model is returned by each
//!   Maximization pass; the caller retains the previous one only as the
//!   "old model" for the next Expectation step.
//! - All randomness (random partitions, grid perturbation, k-means
//!   seeding) is drawn from the explicitly threaded `StdRng`.
//! - The cancellation token is polled once per example scanned in every
//!   data pass; cancellation surfaces as `ClusterError::Cancelled`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `data` is validated (finite, non-empty) and `2 <= k <= n` has been
//!   checked by the run controller before any function here is called.
//! - Membership rows with positive mass sum to 1 after every completed
//!   Expectation pass; total-underflow rows stay at zero and are resolved
//!   by the random tie-break during hard assignment.
//! - Numerical failures (singular covariance, non-finite log-likelihood)
//!   are reported as recoverable `ClusterError` variants; the run
//!   controller decides whether to retry.
//!
//! Conventions
//! -----------
//! - The scalar ("spherical") variance convention sums full squared
//!   Euclidean deviations with no division by the feature count, in both
//!   the Maximization update and the density evaluation, so the two stay
//!   consistent.
//! - In the full-covariance Expectation step, an example whose density
//!   overflows to +inf for one or more clusters is "saturated": each
//!   overflowing cluster receives weight 1 and all others 0, so the
//!   normalized row holds `1/(number of overflowing clusters)` — this
//!   reproduces the documented guard exactly rather than re-normalizing
//!   against the finite densities.
//!
//! Testing notes
//! -------------
//! - Unit tests below pin the M-step formulas, the row-stochastic
//!   invariant of both E-step variants, the saturation guard, singular
//!   covariance detection, and the per-strategy initializer shapes.

use crate::{
    clustering::{
        core::{
            control::StopToken,
            data::ClusterData,
            init::InitStrategy,
            membership::Membership,
            model::{CovarianceModel, MixtureModel, VARIANCE_EPSILON},
            workspace::RunWorkspace,
        },
        errors::{ClusterError, ClusterResult},
    },
    seeding::kmeans::kmeans_partition,
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1};
use rand::{rngs::StdRng, Rng};
use std::f64::consts::PI;

/// Produce the starting `(Membership, MixtureModel)` pair for one run.
///
/// Dispatches on the configured strategy, then — when `correlated` is set —
/// replaces the scalar variances with full covariance matrices computed in
/// one aggregation pass from the initial membership and the means just
/// derived.
///
/// # Errors
/// - `ClusterError::Cancelled` if the token fires during a data pass.
/// - Propagates k-means seeding errors for the seeded strategy.
pub fn initialize(
    data: &ClusterData, k: usize, strategy: InitStrategy, correlated: bool, rng: &mut StdRng,
    token: &StopToken,
) -> ClusterResult<(Membership, MixtureModel)> {
    let (membership, mut model) = match strategy {
        InitStrategy::RandomAssignment => {
            let partition = random_partition(data, k, rng, token)?;
            let membership = Membership::from_partition(&partition, k);
            let model = partition_parameters(data, &partition, k, token)?;
            (membership, model)
        }
        InitStrategy::SeededByClustering { measure, max_iterations } => {
            let partition = kmeans_partition(data, k, measure, max_iterations, rng)?;
            let membership = Membership::from_partition(&partition, k);
            let model = partition_parameters(data, &partition, k, token)?;
            (membership, model)
        }
        InitStrategy::AverageParameters => {
            let model = average_parameters(data, k, rng);
            // No hard partition exists for this strategy; one spherical
            // Expectation pass supplies the initial membership.
            let membership = expect_spherical(data, &model, token)?;
            (membership, model)
        }
    };

    if correlated {
        let covariances = covariances_from_membership(data, &membership, &model.means, token)?;
        model.covariance = CovarianceModel::Full(covariances);
    }

    Ok((membership, model))
}

/// Expectation step, scalar-variance form.
///
/// For each example and cluster, evaluates the isotropic Gaussian density
/// at the example (variance floored at [`VARIANCE_EPSILON`] when exactly
/// zero), scales it by the cluster prior, and row-normalizes the result.
///
/// # Errors
/// - `ClusterError::Cancelled` if the token fires mid-pass.
pub fn expect_spherical(
    data: &ClusterData, model: &MixtureModel, token: &StopToken,
) -> ClusterResult<Membership> {
    let CovarianceModel::Spherical(variances) = &model.covariance else {
        unreachable!("spherical expectation requires a spherical model");
    };
    let n = data.n_examples();
    let k = model.k();
    let d = data.n_features() as f64;

    let mut membership = Membership::zeros(n, k);
    let mut row = vec![0.0_f64; k];
    for j in 0..n {
        check_cancelled(token)?;
        for (i, weight) in row.iter_mut().enumerate() {
            let variance = if variances[i] == 0.0 { VARIANCE_EPSILON } else { variances[i] };
            let dist_sq = squared_distance(data.row(j), model.means.row(i));
            let coefficient = (2.0 * PI * variance).powf(-d / 2.0);
            *weight = model.priors[i] * coefficient * (-dist_sq / (2.0 * variance)).exp();
        }
        membership.set_row(j, &row);
    }
    membership.normalize_rows();
    Ok(membership)
}

/// Expectation step, full-covariance form.
///
/// Evaluates the multivariate Gaussian density through each cluster's
/// covariance inverse and determinant. Examples whose density overflows to
/// +inf are saturated per the documented guard (see the module notes).
///
/// # Errors
/// - `ClusterError::SingularCovariance` if any cluster covariance has a
///   non-positive or non-finite determinant, or cannot be inverted.
/// - `ClusterError::Cancelled` if the token fires mid-pass.
pub fn expect_full(
    data: &ClusterData, model: &MixtureModel, token: &StopToken,
) -> ClusterResult<Membership> {
    let CovarianceModel::Full(covariances) = &model.covariance else {
        unreachable!("full expectation requires a correlated model");
    };
    let n = data.n_examples();
    let k = model.k();
    let d = data.n_features() as f64;

    // Invert every covariance once per pass; failure here is the numerical
    // failure the run controller retries on.
    let mut inverses = Vec::with_capacity(k);
    let mut coefficients = Vec::with_capacity(k);
    for (i, covariance) in covariances.iter().enumerate() {
        let det = covariance.determinant();
        if !det.is_finite() || det <= 0.0 {
            return Err(ClusterError::SingularCovariance { cluster: i });
        }
        let inverse = covariance
            .clone()
            .try_inverse()
            .ok_or(ClusterError::SingularCovariance { cluster: i })?;
        inverses.push(inverse);
        coefficients.push(model.priors[i] / ((2.0 * PI).powf(d / 2.0) * det.sqrt()));
    }

    let mut membership = Membership::zeros(n, k);
    let mut row = vec![0.0_f64; k];
    for j in 0..n {
        check_cancelled(token)?;
        let x = to_dvector(data.row(j));
        let mut saturated = false;
        for i in 0..k {
            let mean = to_dvector(model.means.row(i));
            let diff = &x - &mean;
            let quad = (&inverses[i] * &diff).dot(&diff);
            let density = coefficients[i] * (-0.5 * quad).exp();
            if density.is_infinite() {
                saturated = true;
            }
            row[i] = density;
        }
        if saturated {
            for weight in row.iter_mut() {
                *weight = if weight.is_infinite() { 1.0 } else { 0.0 };
            }
        }
        membership.set_row(j, &row);
    }
    membership.normalize_rows();
    Ok(membership)
}

/// Maximization step: re-estimate means, priors, and the covariance
/// representation from the current membership.
///
/// `new mean_i = Σ_j m[j][i]·x_j / Σ_j m[j][i]`,
/// `new prior_i = Σ_j m[j][i] / N`, and per mode either the scalar
/// variance `Σ_j m[j][i]·‖x_j − mean_i‖² / Σ_j m[j][i]` or the full
/// covariance `Σ_j m[j][i]·(x_j − mean_i)(x_j − mean_i)ᵗ / Σ_j m[j][i]`.
///
/// # Errors
/// - `ClusterError::Cancelled` if the token fires mid-pass.
pub fn maximize(
    data: &ClusterData, membership: &Membership, correlated: bool, workspace: &mut RunWorkspace,
    token: &StopToken,
) -> ClusterResult<MixtureModel> {
    let n = data.n_examples();
    let k = membership.k();
    let d = data.n_features();

    workspace.reset();
    for j in 0..n {
        check_cancelled(token)?;
        for i in 0..k {
            let m = membership.prob(j, i);
            workspace.weights[i] += m;
            for (f, &x) in data.row(j).iter().enumerate() {
                workspace.weighted_sums[(i, f)] += m * x;
            }
        }
    }

    let mut means = Array2::zeros((k, d));
    let mut priors = Array1::zeros(k);
    for i in 0..k {
        let weight = workspace.weights[i];
        priors[i] = weight / n as f64;
        for f in 0..d {
            means[(i, f)] = workspace.weighted_sums[(i, f)] / weight;
        }
    }

    let covariance = if correlated {
        let covariances = covariances_from_membership(data, membership, &means, token)?;
        CovarianceModel::Full(covariances)
    } else {
        let mut variances = Array1::zeros(k);
        for j in 0..n {
            check_cancelled(token)?;
            for i in 0..k {
                variances[i] += membership.prob(j, i) * squared_distance(data.row(j), means.row(i));
            }
        }
        for i in 0..k {
            variances[i] /= workspace.weights[i];
        }
        CovarianceModel::Spherical(variances)
    };

    Ok(MixtureModel { means, priors, covariance })
}

/// Membership-weighted covariance matrices around the given means.
///
/// Shared by the correlated Maximization update and by initialization,
/// which replaces the freshly derived scalar variances with one aggregation
/// pass over the initial membership.
pub fn covariances_from_membership(
    data: &ClusterData, membership: &Membership, means: &Array2<f64>, token: &StopToken,
) -> ClusterResult<Vec<DMatrix<f64>>> {
    let n = data.n_examples();
    let k = membership.k();
    let d = data.n_features();

    let mut covariances = vec![DMatrix::<f64>::zeros(d, d); k];
    let mut weights = vec![0.0_f64; k];
    for j in 0..n {
        check_cancelled(token)?;
        let x = to_dvector(data.row(j));
        for (i, covariance) in covariances.iter_mut().enumerate() {
            let m = membership.prob(j, i);
            if m == 0.0 {
                continue;
            }
            let diff = &x - &to_dvector(means.row(i));
            *covariance += m * (&diff * diff.transpose());
            weights[i] += m;
        }
    }
    for (covariance, &weight) in covariances.iter_mut().zip(weights.iter()) {
        *covariance /= weight;
    }
    Ok(covariances)
}

/// Log-likelihood criterion: `Σ_j ln(Σ_i prior_i · m[j][i])`.
///
/// # Errors
/// Returns `ClusterError::NonFiniteLogLikelihood` when the sum evaluates
/// to NaN or ±inf (for instance after a total-underflow membership row);
/// the run controller treats this as a recoverable numerical failure.
pub fn log_likelihood(membership: &Membership, priors: &Array1<f64>) -> ClusterResult<f64> {
    let mut total = 0.0;
    for row in membership.probs().rows() {
        let mixture: f64 = row.iter().zip(priors.iter()).map(|(&m, &p)| p * m).sum();
        total += mixture.ln();
    }
    if !total.is_finite() {
        return Err(ClusterError::NonFiniteLogLikelihood { value: total });
    }
    Ok(total)
}

// ---- Helper methods ----

fn check_cancelled(token: &StopToken) -> ClusterResult<()> {
    if token.is_cancelled() {
        return Err(ClusterError::Cancelled);
    }
    Ok(())
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

fn to_dvector(view: ArrayView1<'_, f64>) -> DVector<f64> {
    DVector::from_iterator(view.len(), view.iter().copied())
}

/// Uniformly random K-way partition with every cluster non-empty.
///
/// Re-draws the whole assignment until all clusters are hit; `k <= n` is a
/// precondition, so the loop terminates with probability 1.
fn random_partition(
    data: &ClusterData, k: usize, rng: &mut StdRng, token: &StopToken,
) -> ClusterResult<Array1<usize>> {
    let n = data.n_examples();
    let mut partition = Array1::zeros(n);
    loop {
        check_cancelled(token)?;
        let mut seen = vec![false; k];
        for slot in partition.iter_mut() {
            let cluster = rng.gen_range(0..k);
            *slot = cluster;
            seen[cluster] = true;
        }
        if seen.iter().all(|&hit| hit) {
            return Ok(partition);
        }
    }
}

/// Spherical mixture parameters derived from a hard partition: per-cluster
/// feature sums seed the means, priors come from the partition counts, and
/// each scalar variance is the mean squared deviation of the cluster's
/// members from its mean.
fn partition_parameters(
    data: &ClusterData, partition: &Array1<usize>, k: usize, token: &StopToken,
) -> ClusterResult<MixtureModel> {
    let n = data.n_examples();
    let d = data.n_features();

    let mut means = Array2::zeros((k, d));
    let mut counts = vec![0.0_f64; k];
    for j in 0..n {
        check_cancelled(token)?;
        let cluster = partition[j];
        counts[cluster] += 1.0;
        let mut row = means.row_mut(cluster);
        row += &data.row(j);
    }
    for i in 0..k {
        let mut row = means.row_mut(i);
        row /= counts[i];
    }

    let mut variances = Array1::zeros(k);
    for j in 0..n {
        check_cancelled(token)?;
        let cluster = partition[j];
        variances[cluster] += squared_distance(data.row(j), means.row(cluster));
    }
    let mut priors = Array1::zeros(k);
    for i in 0..k {
        variances[i] /= counts[i];
        priors[i] = counts[i] / n as f64;
    }

    Ok(MixtureModel { means, priors, covariance: CovarianceModel::Spherical(variances) })
}

/// Average-parameters initialization: spread K means over the per-feature
/// `[min, mean]` and `[mean, max]` intervals, the grid shifted by a random
/// offset scaled to `range / 2K` so restarts diversify; equal priors and
/// spacing-derived variances.
fn average_parameters(data: &ClusterData, k: usize, rng: &mut StdRng) -> MixtureModel {
    let n = data.n_examples();
    let d = data.n_features();

    let mut mins = vec![f64::INFINITY; d];
    let mut maxs = vec![f64::NEG_INFINITY; d];
    let mut avgs = vec![0.0_f64; d];
    for j in 0..n {
        for (f, &value) in data.row(j).iter().enumerate() {
            mins[f] = mins[f].min(value);
            maxs[f] = maxs[f].max(value);
            avgs[f] += value;
        }
    }
    let mut offsets = vec![0.0_f64; d];
    for f in 0..d {
        avgs[f] /= n as f64;
        offsets[f] = rng.gen::<f64>() * (maxs[f] - mins[f]) / (2.0 * k as f64);
    }

    // Lower half of the clusters covers [min, mean], the rest [mean, max];
    // each cluster sits on an evenly spaced interior grid point.
    let low = k / 2 + k % 2;
    let high = k - low;

    let mut means = Array2::zeros((k, d));
    let mut variances = Array1::zeros(k);
    for i in 0..k {
        let mut spacing_sq_sum = 0.0;
        for f in 0..d {
            let (start, span, slots, slot) = if i < low {
                (mins[f], avgs[f] - mins[f], low, i)
            } else {
                (avgs[f], maxs[f] - avgs[f], high, i - low)
            };
            let spacing = span / (slots + 1) as f64;
            means[(i, f)] = start + offsets[f] + (slot + 1) as f64 * spacing;
            spacing_sq_sum += (spacing / 2.0) * (spacing / 2.0);
        }
        variances[i] = spacing_sq_sum / d as f64;
    }

    let priors = Array1::from_elem(k, 1.0 / k as f64);
    MixtureModel { means, priors, covariance: CovarianceModel::Spherical(variances) }
}
