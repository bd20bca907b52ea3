//! Soft clustering via Expectation-Maximization over Gaussian mixtures.
//!
//! The module splits into `core` (validated value types, scratch buffers,
//! and control plumbing) and `models` (the fitting engine). Errors for the
//! whole domain live in [`errors`].

pub mod core;
pub mod errors;
pub mod models;
