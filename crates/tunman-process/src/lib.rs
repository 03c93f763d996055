//! # tunman-process
//!
//! Low-level process operations for the tunnel supervisor.
//!
//! This crate is the only part of the system that deals with raw process
//! and descriptor semantics. It provides:
//! - Launching the tunnel executable with one inherited TUN descriptor
//!   preserved across `exec` ([`launch`])
//! - Graceful-then-forced termination with a bounded poll budget
//!   ([`terminate`])
//! - Process existence checking ([`process_exists`])
//! - Input validation for launch requests
//! - An integer-convention boundary for embedding hosts ([`raw`])
//!
//! Unix only: the launch contract is defined in terms of `fork`/`exec`
//! descriptor-table semantics.

pub mod check;
pub mod launch;
pub mod raw;
pub mod terminate;
pub mod validation;

pub use check::process_exists;
pub use launch::{launch, LaunchRequest, EXEC_FAILURE_STATUS};
pub use raw::{launch_raw, terminate_raw};
pub use terminate::{terminate, TERM_POLL_ATTEMPTS, TERM_POLL_INTERVAL};
pub use validation::validate_request;
