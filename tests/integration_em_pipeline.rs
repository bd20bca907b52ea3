//! Integration tests for EM mixture clustering.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: from validated cluster data,
//!   through configuration and the multi-run controller, to the fitted
//!   mixture model, hard assignments, and posterior probability table.
//! - Exercise realistic regimes (well-separated blobs, degenerate
//!   duplicated data, k equal to the number of examples) rather than toy
//!   edge cases only.
//!
//! Coverage
//! --------
//! - `clustering::core`:
//!   - `ClusterData` construction and precondition rejection.
//!   - `EMOptions` wiring of initialization strategies and covariance
//!     modes into the fit.
//! - `clustering::models::em::EMModel`:
//!   - Full fits under all three initialization strategies.
//!   - Best-of-runs selection, the covariance fallback, cancellation,
//!     and seed reproducibility.
//! - `seeding::kmeans` (indirectly): the seeded-by-clustering strategy.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of low-level building blocks (validators,
//!   density arithmetic, membership normalization) — these are covered
//!   by unit tests.
//! - Exhaustive stress testing over large sample sizes and parameter
//!   grids — those belong in targeted performance tests.
use ndarray::{array, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_mixture::{
    clustering::{
        core::{
            control::{ProgressReporter, StopToken},
            data::ClusterData,
            init::InitStrategy,
            model::CovarianceModel,
            options::EMOptions,
        },
        errors::ClusterError,
        models::em::EMModel,
    },
    seeding::distance::DistanceMeasure,
};

/// Purpose
/// -------
/// Generate two clearly separated Gaussian-ish blobs with jitter from a
/// seeded RNG, so clustering quality assertions are meaningful but the
/// fixture stays reproducible.
///
/// Parameters
/// ----------
/// - `per_blob`: examples per blob.
/// - `separation`: distance between the blob centers along each axis.
/// - `seed`: RNG seed for the jitter.
fn two_blobs(per_blob: usize, separation: f64, seed: u64) -> ClusterData {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = Array2::zeros((2 * per_blob, 2));
    for blob in 0..2 {
        let center = blob as f64 * separation;
        for i in 0..per_blob {
            let row = blob * per_blob + i;
            values[(row, 0)] = center + rng.gen::<f64>() - 0.5;
            values[(row, 1)] = center + rng.gen::<f64>() - 0.5;
        }
    }
    ClusterData::new(values).expect("generated fixture is finite and non-empty")
}

/// Returns true when the first `per_blob` labels all agree, the rest all
/// agree, and the two groups differ.
fn splits_blobs(assignments: &ndarray::Array1<usize>, per_blob: usize) -> bool {
    let first = assignments[0];
    let second = assignments[per_blob];
    first != second
        && assignments.iter().take(per_blob).all(|&c| c == first)
        && assignments.iter().skip(per_blob).all(|&c| c == second)
}

fn options(k: usize, init: InitStrategy, correlated: bool, seed: u64) -> EMOptions {
    EMOptions::new(k, 5, 200, 1e-10, init, correlated, true, Some(seed))
        .expect("fixture options are valid")
}

#[test]
// Purpose
// -------
// Fit two separated blobs with average-parameters initialization and
// scalar variances; the grid start straddles the gap, so the fit should
// recover the blob structure exactly.
//
// Given
// -----
// - 3 examples per blob (6 total), centers 10 apart, k = 2, a single run
//   with 50 steps and quality 1e-6, fixed seed.
//
// Expect
// ------
// - The one and only run converges; the hard assignments split the blobs
//   cleanly 3/3; fitted means sit near the blob centers.
fn average_parameters_fit_recovers_two_blobs() {
    // Arrange
    let data = two_blobs(3, 10.0, 3);
    let opts = EMOptions::new(
        2,
        1,
        50,
        1e-6,
        InitStrategy::average_parameters(),
        false,
        true,
        Some(21),
    )
    .expect("fixture options are valid");
    let mut engine = EMModel::new(opts);

    // Act
    let outcome = engine.fit(&data).expect("fit should succeed");

    // Assert
    assert_eq!(outcome.runs_completed, 1);
    assert!(outcome.converged);
    assert!(splits_blobs(&outcome.assignments, 3), "assignments = {:?}", outcome.assignments);
    for cluster in 0..2 {
        let mean = outcome.model.means.row(cluster);
        let near_zero = mean.iter().all(|&v| v.abs() < 1.5);
        let near_ten = mean.iter().all(|&v| (v - 10.0).abs() < 1.5);
        assert!(near_zero || near_ten, "mean {cluster} = {mean:?}");
    }
}

#[test]
// Purpose
// -------
// Fit the same blobs with random-assignment initialization; 5 restarts
// with best-of selection should find the separating solution.
//
// Given
// -----
// - 8 examples per blob, centers 10 apart, k = 2, fixed seed.
//
// Expect
// ------
// - The assignments split the blobs; the posterior table is retained,
//   row-stochastic, and near one-hot given the wide separation.
fn random_assignment_fit_recovers_two_blobs_with_sharp_posteriors() {
    // Arrange
    let data = two_blobs(8, 10.0, 5);
    let mut engine =
        EMModel::new(options(2, InitStrategy::random_assignment(), false, 4242));

    // Act
    let outcome = engine.fit(&data).expect("fit should succeed");

    // Assert
    assert!(splits_blobs(&outcome.assignments, 8), "assignments = {:?}", outcome.assignments);
    let membership = outcome.membership.as_ref().expect("probabilities were requested");
    for row in membership.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-9);
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(max > 0.999, "posterior should be sharp, row = {row:?}");
    }
    assert_eq!(
        outcome.probability_column_names(),
        vec!["cluster_0_probability", "cluster_1_probability"]
    );
}

#[test]
// Purpose
// -------
// Fit with seeded-by-clustering initialization in correlated mode; the
// k-means start plus full covariances should handle an elongated blob.
//
// Given
// -----
// - Two blobs 10 apart, one stretched 3x along the first axis, k = 2.
//
// Expect
// ------
// - The assignments split the blobs; the fitted covariance model is
//   `Full` with symmetric matrices; no fallback occurred.
fn seeded_correlated_fit_handles_elongated_blobs() {
    // Arrange
    let mut rng = StdRng::seed_from_u64(9);
    let mut values = Array2::zeros((16, 2));
    for i in 0..8 {
        values[(i, 0)] = 3.0 * (rng.gen::<f64>() - 0.5);
        values[(i, 1)] = rng.gen::<f64>() - 0.5;
    }
    for i in 8..16 {
        values[(i, 0)] = 10.0 + rng.gen::<f64>() - 0.5;
        values[(i, 1)] = 10.0 + rng.gen::<f64>() - 0.5;
    }
    let data = ClusterData::new(values).expect("generated fixture is finite and non-empty");
    let init = InitStrategy::seeded_by_clustering(DistanceMeasure::SquaredEuclidean);
    let mut engine = EMModel::new(options(2, init, true, 77));

    // Act
    let outcome = engine.fit(&data).expect("fit should succeed");

    // Assert
    assert!(!outcome.fallback_applied);
    assert!(splits_blobs(&outcome.assignments, 8), "assignments = {:?}", outcome.assignments);
    let CovarianceModel::Full(covariances) = &outcome.model.covariance else {
        panic!("correlated fit must produce full covariances");
    };
    for c in covariances {
        assert!((c[(0, 1)] - c[(1, 0)]).abs() < 1e-9, "covariance must be symmetric");
    }
}

#[test]
// Purpose
// -------
// Fit with k equal to the number of examples: each example should end up
// dominating its own cluster.
//
// Given
// -----
// - 4 well-separated points, k = 4, random-assignment initialization.
//
// Expect
// ------
// - The hard assignment is a bijection onto {0, 1, 2, 3}; each example's
//   top posterior exceeds 0.999; every prior is 1/N.
fn fit_with_k_equal_to_n_isolates_every_example() {
    // Arrange
    let data = ClusterData::new(array![
        [0.0, 0.0],
        [10.0, 0.0],
        [0.0, 10.0],
        [10.0, 10.0],
    ])
    .expect("fixture data is finite and non-empty");
    let mut engine =
        EMModel::new(options(4, InitStrategy::random_assignment(), false, 13));

    // Act
    let outcome = engine.fit(&data).expect("fit should succeed");

    // Assert
    let mut counts = [0_usize; 4];
    for &c in outcome.assignments.iter() {
        counts[c] += 1;
    }
    assert!(counts.iter().all(|&count| count == 1), "counts = {counts:?}");
    for &prior in outcome.model.priors.iter() {
        assert!((prior - 0.25).abs() < 1e-9, "priors = {:?}", outcome.model.priors);
    }
    let membership = outcome.membership.as_ref().expect("probabilities were requested");
    for row in membership.rows() {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(max > 0.999, "row = {row:?}");
    }
}

#[test]
// Purpose
// -------
// Drive the fallback end to end: duplicated data makes every correlated
// run fail with a singular covariance, so the controller must restart
// with scalar variances and still deliver a model.
//
// Given
// -----
// - 6 identical examples, k = 2, correlated mode, 3 runs, fixed seed,
//   a recording progress reporter.
//
// Expect
// ------
// - The fit succeeds with `fallback_applied` set and a spherical model;
//   the progress total was extended to twice the run budget; reported
//   `completed` never exceeds the reported `total`.
fn correlated_fit_on_duplicated_data_falls_back_and_succeeds() {
    // Arrange
    let data = ClusterData::new(Array2::from_elem((6, 2), 4.5))
        .expect("fixture data is finite and non-empty");
    let opts = EMOptions::new(
        2,
        3,
        50,
        1e-10,
        InitStrategy::random_assignment(),
        true,
        false,
        Some(31),
    )
    .expect("fixture options are valid");
    let mut engine = EMModel::new(opts);

    struct Recorder {
        calls: Vec<(usize, usize)>,
    }
    impl ProgressReporter for Recorder {
        fn report(&mut self, completed: usize, total: usize) {
            self.calls.push((completed, total));
        }
    }
    let mut recorder = Recorder { calls: Vec::new() };
    let token = StopToken::new();

    // Act
    let outcome = engine
        .fit_with_control(&data, &token, &mut recorder)
        .expect("fallback should rescue the fit");

    // Assert
    assert!(outcome.fallback_applied);
    assert!(matches!(outcome.model.covariance, CovarianceModel::Spherical(_)));
    assert_eq!(outcome.runs_completed, 3);
    assert!(recorder.calls.iter().all(|&(completed, total)| completed <= total));
    assert_eq!(recorder.calls.iter().map(|&(_, t)| t).max(), Some(6));
}

#[test]
// Purpose
// -------
// Verify end-to-end reproducibility: two engines with the same seed over
// the same data must agree on every outcome field that matters.
//
// Given
// -----
// - The two-blob fixture and two identically configured engines.
//
// Expect
// ------
// - Identical assignments, log-likelihoods, means, priors, and posterior
//   tables.
fn seeded_fits_are_bit_reproducible() {
    // Arrange
    let data = two_blobs(6, 8.0, 2);
    let mut first = EMModel::new(options(2, InitStrategy::random_assignment(), false, 99));
    let mut second = EMModel::new(options(2, InitStrategy::random_assignment(), false, 99));

    // Act
    let a = first.fit(&data).expect("fit should succeed").clone();
    let b = second.fit(&data).expect("fit should succeed").clone();

    // Assert
    assert_eq!(a.assignments, b.assignments);
    assert_eq!(a.log_likelihood, b.log_likelihood);
    assert_eq!(a.model.means, b.model.means);
    assert_eq!(a.model.priors, b.model.priors);
    assert_eq!(a.membership, b.membership);
}

#[test]
// Purpose
// -------
// Verify mid-fit cancellation through a shared token.
//
// Given
// -----
// - A reporter that cancels the token after the first completed run of a
//   5-run fit.
//
// Expect
// ------
// - The fit returns `Err(Cancelled)` and no outcome is stored.
fn cancelling_mid_fit_aborts_with_cancelled() {
    // Arrange
    let data = two_blobs(6, 8.0, 8);
    let mut engine = EMModel::new(options(2, InitStrategy::random_assignment(), false, 15));

    struct CancelAfterFirstRun {
        token: StopToken,
    }
    impl ProgressReporter for CancelAfterFirstRun {
        fn report(&mut self, completed: usize, _total: usize) {
            if completed >= 1 {
                self.token.cancel();
            }
        }
    }
    let token = StopToken::new();
    let mut reporter = CancelAfterFirstRun { token: token.clone() };

    // Act
    let result = engine.fit_with_control(&data, &token, &mut reporter);

    // Assert
    assert_eq!(result.unwrap_err(), ClusterError::Cancelled);
    assert!(engine.outcome().is_none());
}

#[test]
// Purpose
// -------
// Verify that dataset validation rejects non-finite cells and that the
// dataset-vs-k precondition fires before any computation.
//
// Given
// -----
// - A matrix with a NaN cell, and separately a valid 3-example dataset
//   with k = 4.
//
// Expect
// ------
// - `NonFiniteValue` naming the offending cell; `TooFewExamples` for the
//   undersized dataset.
fn invalid_inputs_are_rejected_with_typed_errors() {
    // Arrange
    let bad = ClusterData::new(array![[0.0, 1.0], [f64::NAN, 2.0]]);
    let small = ClusterData::new(array![[0.0], [1.0], [2.0]])
        .expect("fixture data is finite and non-empty");
    let mut engine = EMModel::new(options(4, InitStrategy::random_assignment(), false, 1));

    // Act / Assert
    assert!(matches!(
        bad.unwrap_err(),
        ClusterError::NonFiniteValue { row: 1, col: 0, .. }
    ));
    assert_eq!(
        engine.fit(&small).unwrap_err(),
        ClusterError::TooFewExamples { examples: 3, k: 4 }
    );
}
