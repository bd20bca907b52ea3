//! Fitting engines for mixture clustering: the EM run controller and the
//! numeric internals (initializers, Expectation/Maximization passes,
//! log-likelihood) it drives.

pub mod em;
pub mod em_internals;
