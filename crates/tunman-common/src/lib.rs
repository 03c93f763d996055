//! # tunman-common
//!
//! Shared error types for the tunnel process supervisor workspace.
//!
//! Every other crate in the workspace depends on this one for its
//! [`ProcessError`]/[`ProcessResult`] pair, so failure shapes stay uniform
//! from the low-level launch primitives up to the CLI.

pub mod errors;

pub use errors::{ProcessError, ProcessResult};
