//! Graceful-then-forced tunnel process termination.
//!
//! A stop request first gives the tunnel a chance to flush and release its
//! resources (notably the TUN descriptor) via `SIGTERM`, polling for exit
//! with a bounded budget. If the process has not exited when the budget is
//! exhausted, it is force-killed and reaped unconditionally, so repeated
//! start/stop cycles never accumulate zombies in a long-lived caller.

use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use tunman_common::{ProcessError, ProcessResult};

/// Number of non-blocking exit checks after the graceful signal.
pub const TERM_POLL_ATTEMPTS: u32 = 10;

/// Delay between exit checks. Together with [`TERM_POLL_ATTEMPTS`] this
/// caps the graceful phase at roughly one second.
pub const TERM_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shutdown progress for a signaled process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReapPhase {
    /// Graceful signal delivered; polling for exit with a bounded budget.
    Polling { attempts_left: u32 },
    /// Budget exhausted; force-kill and reap unconditionally.
    ForceKill,
    /// Exit status collected. Terminal.
    Reaped,
}

/// Terminate a process previously returned by [`crate::launch`].
///
/// Sends `SIGTERM`, polls for exit up to [`TERM_POLL_ATTEMPTS`] times with
/// [`TERM_POLL_INTERVAL`] between attempts, then escalates to `SIGKILL`
/// plus one blocking wait. `Ok(())` means the process is confirmed reaped;
/// a well-behaved process that exits within the budget never receives the
/// forced signal.
///
/// Blocks the calling thread for up to the full poll budget. At most one
/// in-flight termination per PID; the identifier must not be reused after
/// this returns.
///
/// # Errors
///
/// A non-positive `pid` is rejected before any OS action. A graceful
/// signal that cannot be delivered (process already gone, permission
/// denied) fails immediately without escalation.
pub fn terminate(pid: Pid) -> ProcessResult<()> {
    if pid.as_raw() <= 0 {
        return Err(ProcessError::invalid_pid(pid.as_raw()));
    }

    debug!(pid = pid.as_raw(), "requesting graceful tunnel exit");
    kill(pid, Signal::SIGTERM)
        .map_err(|e| ProcessError::signal_failed(pid.as_raw(), "SIGTERM", e.desc()))?;

    let mut phase = ReapPhase::Polling {
        attempts_left: TERM_POLL_ATTEMPTS,
    };

    loop {
        phase = match phase {
            ReapPhase::Polling { attempts_left: 0 } => {
                warn!(
                    pid = pid.as_raw(),
                    "graceful exit budget exhausted, escalating to force kill"
                );
                ReapPhase::ForceKill
            }
            ReapPhase::Polling { attempts_left } => {
                match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                    Ok(WaitStatus::StillAlive) => {
                        thread::sleep(TERM_POLL_INTERVAL);
                        ReapPhase::Polling {
                            attempts_left: attempts_left - 1,
                        }
                    }
                    Ok(status) => {
                        debug!(pid = pid.as_raw(), ?status, "tunnel process exited");
                        ReapPhase::Reaped
                    }
                    Err(Errno::EINTR) => ReapPhase::Polling { attempts_left },
                    Err(e) => return Err(ProcessError::reap_failed(pid.as_raw(), e.desc())),
                }
            }
            ReapPhase::ForceKill => {
                // A zombie still reaps after this; a delivery failure only
                // means the pid vanished between polls, so it is ignored and
                // the blocking wait below settles the outcome.
                let _ = kill(pid, Signal::SIGKILL);
                loop {
                    match waitpid(pid, None) {
                        Ok(status) => {
                            debug!(pid = pid.as_raw(), ?status, "tunnel process force-killed");
                            break;
                        }
                        Err(Errno::EINTR) => continue,
                        Err(e) => return Err(ProcessError::reap_failed(pid.as_raw(), e.desc())),
                    }
                }
                ReapPhase::Reaped
            }
            ReapPhase::Reaped => {
                info!(pid = pid.as_raw(), "tunnel process reaped");
                return Ok(());
            }
        };
    }
}
