//! Core value types and plumbing for EM clustering: validated data and
//! options, the initialization-policy enum, mixture-model containers, the
//! membership matrix, per-run scratch buffers, and cancellation/progress
//! control.

pub mod control;
pub mod data;
pub mod init;
pub mod membership;
pub mod model;
pub mod options;
pub mod validation;
pub mod workspace;
