//! EM mixture-model clustering: the public fitting engine and its
//! multi-run controller.
//!
//! Purpose
//! -------
//! Drive the full fit: validate the dataset against the configuration, run
//! up to `max_runs` independent EM runs from fresh random starts, absorb
//! recoverable numerical failures by granting retries, apply the one-time
//! covariance fallback when correlated mode proves numerically hopeless,
//! and keep the run whose log-likelihood magnitude is largest.
//!
//! Key behaviors
//! -------------
//! - Each run alternates Expectation and Maximization until the absolute
//!   change in log-likelihood drops below `quality` or the per-run step
//!   cap is hit; a run that stops either way still yields a usable model.
//! - A run that fails numerically (singular covariance, non-finite
//!   log-likelihood) is discarded wholesale and earns one extra attempt,
//!   up to `max_runs` extra attempts in total.
//! - When the retry budget is exhausted in correlated mode with fewer than
//!   49% of the planned runs completed, the controller falls back to
//!   scalar variances once: counters reset, the progress total is extended
//!   by another `max_runs`, and the outer loop restarts in the cheaper
//!   representation. Completed correlated runs stay in contention.
//! - If no run ever completes, the fit fails with
//!   `ClusterError::NoModelComputed`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `fit` never returns a partially fitted outcome: either every field of
//!   [`EMOutcome`] is populated from one winning run, or an error is
//!   returned and the previous outcome (if any) is left untouched.
//! - With `random_seed: Some(s)` the whole fit, including tie-breaking in
//!   the hard assignment, is reproducible bit for bit.
//!
//! Conventions
//! -----------
//! - "Completed" counts runs that produced a model (converged or step-cap
//!   exhausted); "failed" counts discarded numerical failures. Cancellation
//!   is neither: it aborts the fit immediately.
//! - Diagnostics go through the `log` facade at debug level (warn for the
//!   fallback); the numeric internals themselves never log.
//!
//! Downstream usage
//! ----------------
//! - Construct [`EMOptions`], wrap them in an [`EMModel`], call
//!   [`EMModel::fit`] (or [`EMModel::fit_with_control`] for cancellation
//!   and progress), then read the [`EMOutcome`].
//!
//! Testing notes
//! -------------
//! - Unit tests below pin the controller's counters, the fallback path,
//!   cancellation, and seed reproducibility on small fixtures; end-to-end
//!   behavior on separated data lives in the integration tests.

use crate::clustering::{
    core::{
        control::{NoProgress, ProgressReporter, StopToken},
        data::ClusterData,
        membership::Membership,
        model::MixtureModel,
        options::EMOptions,
        validation::validate_dataset_for_k,
        workspace::RunWorkspace,
    },
    errors::{ClusterError, ClusterResult},
    models::em_internals::{expect_full, expect_spherical, initialize, log_likelihood, maximize},
};
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, SeedableRng};

/// EMOutcome — the result of a completed fit.
///
/// Fields
/// ------
/// - `model`: parameters of the winning run.
/// - `log_likelihood`: the winning run's final criterion value.
/// - `assignments`: hard per-example cluster labels derived from the
///   winning run's final membership (ties broken at random).
/// - `membership`: the winning run's N×K posterior matrix, retained only
///   when `show_probabilities` was set.
/// - `runs_completed`: completed runs in the final phase (post-fallback if
///   one occurred).
/// - `failed_runs`: numerical failures discarded across the whole fit.
/// - `fallback_applied`: whether the covariance fallback fired.
/// - `converged`: whether the winning run converged (as opposed to hitting
///   the step cap).
#[derive(Debug, Clone)]
pub struct EMOutcome {
    pub model: MixtureModel,
    pub log_likelihood: f64,
    pub assignments: Array1<usize>,
    pub membership: Option<Array2<f64>>,
    pub runs_completed: usize,
    pub failed_runs: usize,
    pub fallback_applied: bool,
    pub converged: bool,
}

impl EMOutcome {
    /// Number of clusters in the fitted model.
    pub fn k(&self) -> usize {
        self.model.k()
    }

    /// Column names for a probability table derived from `membership`,
    /// in cluster order: `cluster_0_probability`, `cluster_1_probability`,
    /// and so on.
    pub fn probability_column_names(&self) -> Vec<String> {
        (0..self.k()).map(|i| format!("cluster_{i}_probability")).collect()
    }
}

/// EMModel — configured fitting engine holding the last outcome.
///
/// A thin stateful wrapper: options in, outcome out. Refitting replaces
/// the stored outcome; a failed fit leaves it untouched.
#[derive(Debug)]
pub struct EMModel {
    options: EMOptions,
    outcome: Option<EMOutcome>,
}

impl EMModel {
    /// Wrap a validated configuration; no computation happens yet.
    pub fn new(options: EMOptions) -> Self {
        EMModel { options, outcome: None }
    }

    /// The configuration this engine was built with.
    pub fn options(&self) -> &EMOptions {
        &self.options
    }

    /// The most recent successful outcome, if any.
    pub fn outcome(&self) -> Option<&EMOutcome> {
        self.outcome.as_ref()
    }

    /// Fit the mixture to `data` without cancellation or progress hooks.
    ///
    /// # Errors
    /// - Dataset precondition failures (`TooFewExamples`).
    /// - `ClusterError::NoModelComputed` if every run failed numerically
    ///   even after the retry budget and (where applicable) the fallback.
    pub fn fit(&mut self, data: &ClusterData) -> ClusterResult<&EMOutcome> {
        self.fit_with_control(data, &StopToken::new(), &mut NoProgress)
    }

    /// Fit with cooperative cancellation and progress reporting.
    ///
    /// `reporter.report(completed, total)` fires after every finished or
    /// failed run; `total` is extended when the fallback restarts the
    /// outer loop.
    ///
    /// # Errors
    /// As [`EMModel::fit`], plus `ClusterError::Cancelled` when `token`
    /// fires mid-computation.
    pub fn fit_with_control(
        &mut self, data: &ClusterData, token: &StopToken, reporter: &mut dyn ProgressReporter,
    ) -> ClusterResult<&EMOutcome> {
        let outcome = run_controller(data, &self.options, token, reporter)?;
        Ok(self.outcome.insert(outcome))
    }
}

/// One completed run, pending best-of selection.
struct CandidateModel {
    model: MixtureModel,
    membership: Membership,
    log_likelihood: f64,
}

/// How a single run ended. Numerical failures are a first-class outcome
/// here, not an error: the controller's retry/fallback policy consumes
/// them, while genuinely fatal errors keep propagating as `Err`.
enum RunOutcome {
    Converged(CandidateModel),
    Exhausted(CandidateModel),
    NumericalFailure(ClusterError),
}

fn run_controller(
    data: &ClusterData, options: &EMOptions, token: &StopToken,
    reporter: &mut dyn ProgressReporter,
) -> ClusterResult<EMOutcome> {
    validate_dataset_for_k(data, options.k)?;

    let mut rng = match options.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut workspace = RunWorkspace::new(options.k, data.n_features());

    let mut correlated = options.correlated_attributes;
    let mut fallback_applied = false;
    let mut total = options.max_runs;
    let mut completed = 0_usize;
    let mut failures = 0_usize;
    let mut total_failures = 0_usize;
    let mut attempted = 0_usize;
    let mut best: Option<(CandidateModel, bool)> = None;

    while completed < options.max_runs {
        if token.is_cancelled() {
            return Err(ClusterError::Cancelled);
        }
        attempted += 1;

        match single_run(data, options, correlated, &mut workspace, &mut rng, token)? {
            RunOutcome::Converged(candidate) => {
                completed += 1;
                log::debug!(
                    "run {attempted}: converged at log-likelihood {:.6}",
                    candidate.log_likelihood
                );
                keep_if_better(&mut best, candidate, true);
            }
            RunOutcome::Exhausted(candidate) => {
                completed += 1;
                log::debug!(
                    "run {attempted}: step cap hit at log-likelihood {:.6}",
                    candidate.log_likelihood
                );
                keep_if_better(&mut best, candidate, false);
            }
            RunOutcome::NumericalFailure(err) => {
                failures += 1;
                total_failures += 1;
                log::debug!("run {attempted} discarded: {err}");
                if failures > options.max_runs {
                    let threshold = (0.49 * options.max_runs as f64).ceil() as usize;
                    if correlated && !fallback_applied && completed < threshold {
                        correlated = false;
                        fallback_applied = true;
                        completed = 0;
                        failures = 0;
                        total += options.max_runs;
                        log::warn!(
                            "correlated covariances unstable on this dataset; \
                             restarting with scalar variances"
                        );
                    } else {
                        break;
                    }
                }
            }
        }
        reporter.report(completed, total);
    }

    let Some((winner, converged)) = best else {
        return Err(ClusterError::NoModelComputed { attempted_runs: attempted });
    };
    let assignments = winner.membership.hard_assignments(&mut rng);
    let membership = options.show_probabilities.then(|| winner.membership.into_inner());

    Ok(EMOutcome {
        model: winner.model,
        log_likelihood: winner.log_likelihood,
        assignments,
        membership,
        runs_completed: completed,
        failed_runs: total_failures,
        fallback_applied,
        converged,
    })
}

/// Best-of-runs rule: a candidate replaces the incumbent when the magnitude
/// of its log-likelihood is strictly larger.
fn keep_if_better(
    best: &mut Option<(CandidateModel, bool)>, candidate: CandidateModel, converged: bool,
) {
    let improves = best
        .as_ref()
        .map(|(b, _)| candidate.log_likelihood.abs() > b.log_likelihood.abs())
        .unwrap_or(true);
    if improves {
        *best = Some((candidate, converged));
    }
}

/// One EM run from a fresh random start, mapped into the [`RunOutcome`]
/// state machine: recoverable numerical errors become
/// `RunOutcome::NumericalFailure`, fatal ones (cancellation) stay `Err`.
fn single_run(
    data: &ClusterData, options: &EMOptions, correlated: bool, workspace: &mut RunWorkspace,
    rng: &mut StdRng, token: &StopToken,
) -> ClusterResult<RunOutcome> {
    match run_em_loop(data, options, correlated, workspace, rng, token) {
        Ok(outcome) => Ok(outcome),
        Err(err) if err.is_recoverable() => Ok(RunOutcome::NumericalFailure(err)),
        Err(err) => Err(err),
    }
}

/// The E/M alternation of one run.
///
/// The log-likelihood of the initial membership serves as the convergence
/// baseline, so at least one full E/M pass happens before any stop check.
fn run_em_loop(
    data: &ClusterData, options: &EMOptions, correlated: bool, workspace: &mut RunWorkspace,
    rng: &mut StdRng, token: &StopToken,
) -> ClusterResult<RunOutcome> {
    let (mut membership, mut model) =
        initialize(data, options.k, options.init, correlated, rng, token)?;
    let mut previous = log_likelihood(&membership, &model.priors)?;
    let mut current = previous;
    let mut converged = false;

    for _ in 0..options.max_optimization_steps {
        membership = if correlated {
            expect_full(data, &model, token)?
        } else {
            expect_spherical(data, &model, token)?
        };
        model = maximize(data, &membership, correlated, workspace, token)?;
        current = log_likelihood(&membership, &model.priors)?;
        if (current - previous).abs() < options.quality {
            converged = true;
            break;
        }
        previous = current;
    }

    let candidate = CandidateModel { model, membership, log_likelihood: current };
    Ok(if converged {
        RunOutcome::Converged(candidate)
    } else {
        RunOutcome::Exhausted(candidate)
    })
}
