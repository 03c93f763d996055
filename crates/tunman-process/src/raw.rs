//! Integer-convention boundary for embedding hosts.
//!
//! Some embedders consume this crate across a call boundary that carries
//! two path strings, one descriptor number, and a single integer return.
//! These wrappers map the `Result`-based API onto that convention:
//! [`launch_raw`] returns the child PID or -1, [`terminate_raw`] returns 0
//! or -1. Failure details are logged at `warn` before being collapsed.

use std::os::fd::RawFd;

use nix::unistd::Pid;
use tracing::warn;

use crate::launch::{launch, LaunchRequest};
use crate::terminate::terminate;

/// Sentinel returned across the host boundary on any failure.
pub const BOUNDARY_FAILURE: i32 = -1;

/// Launch the tunnel executable; returns the child PID, or -1 on invalid
/// input or fork failure.
pub fn launch_raw(executable: &str, config: &str, tun_fd: RawFd) -> i32 {
    let request = LaunchRequest::new(executable, config, tun_fd);
    match launch(&request) {
        Ok(pid) => pid.as_raw(),
        Err(e) => {
            warn!(error = %e, "launch rejected at host boundary");
            BOUNDARY_FAILURE
        }
    }
}

/// Terminate a launched process; returns 0 once the process is confirmed
/// reaped, or -1 on an invalid identifier or undeliverable signal.
pub fn terminate_raw(pid: i32) -> i32 {
    match terminate(Pid::from_raw(pid)) {
        Ok(()) => 0,
        Err(e) => {
            warn!(pid, error = %e, "terminate rejected at host boundary");
            BOUNDARY_FAILURE
        }
    }
}
