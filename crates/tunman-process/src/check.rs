//! Process existence checking.
//!
//! Provides a non-destructive liveness check for launched tunnel
//! processes, used by the session layer and the CLI `status` command.

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

use tunman_common::{ProcessError, ProcessResult};

/// Check whether a process with the given PID exists.
///
/// Sends no signal (`kill(pid, 0)`); it only asks the kernel whether the
/// identifier currently refers to a process. Note that a reaped PID may be
/// reused by an unrelated process, so this is a diagnostic, not a
/// substitute for holding on to exit status.
///
/// # Returns
///
/// * `Ok(true)` - process exists (including when owned by another user)
/// * `Ok(false)` - no such process
/// * `Err(_)` - the check itself failed
pub fn process_exists(pid: Pid) -> ProcessResult<bool> {
    match kill(pid, None) {
        Ok(_) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        // Exists, but we may not signal it.
        Err(Errno::EPERM) => Ok(true),
        Err(e) => Err(ProcessError::configuration(format!(
            "Failed to check process {}: {}",
            pid,
            e.desc()
        ))),
    }
}
