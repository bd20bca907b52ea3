//! rust_mixture — soft (probabilistic) clustering via Expectation-Maximization.
//!
//! Purpose
//! -------
//! Fit Gaussian mixture models to tabular numeric data with the classic
//! E/M alternation: posterior membership computation (E-step), parameter
//! re-estimation (M-step), log-likelihood convergence monitoring, and a
//! multi-run restart controller that recovers from numerical failures and
//! keeps the best model found.
//!
//! Key behaviors
//! -------------
//! - Validate datasets and fit configuration up front; no computation is
//!   attempted on data that violates preconditions (missing values, fewer
//!   examples than clusters, no features).
//! - Support three mutually exclusive initialization strategies (random
//!   assignment, k-means seeding, average-parameters) selected once per fit.
//! - Support two covariance representations per model: one scalar variance
//!   per cluster, or one full D×D covariance matrix per cluster.
//! - Retry runs that fail numerically (singular covariances), with a
//!   one-time fallback from full covariances to scalar variances when the
//!   failures cluster early in the run budget.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work is single-threaded, synchronous, and
//!   CPU-bound; cancellation is cooperative via
//!   [`clustering::core::control::StopToken`].
//! - Randomness is always drawn from an explicitly threaded, seedable
//!   generator; fixing `random_seed` makes fits bit-reproducible.
//! - The input dataset is read-only for the duration of a fit.
//!
//! Conventions
//! -----------
//! - Examples are rows, features are columns; indexing is 0-based.
//! - Membership matrices are N×K and row-stochastic after every completed
//!   Expectation step (rows with positive mass sum to 1).
//! - Errors are surfaced as [`clustering::errors::ClusterError`] values;
//!   the core never panics on invalid user input.
//!
//! Downstream usage
//! ----------------
//! - Build a [`clustering::core::data::ClusterData`] and an
//!   [`clustering::core::options::EMOptions`], then fit with
//!   [`clustering::models::em::EMModel`].
//! - Read the fitted mixture, hard assignments, and (optionally) the
//!   per-example membership table from
//!   [`clustering::models::em::EMOutcome`].
//!
//! Testing notes
//! -------------
//! - Unit tests live in `#[cfg(test)]` modules next to the code they cover;
//!   end-to-end fitting scenarios live in `tests/integration_em_pipeline.rs`.

pub mod clustering;
pub mod seeding;
