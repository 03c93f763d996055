//! # tunman-session
//!
//! Session lifecycle over the low-level launch/terminate primitives.
//!
//! [`TunnelSession`] pairs one launch with exactly one termination and
//! makes the ownership rules of the process handle explicit: `start` is
//! only legal from `Stopped`, `stop` only while a process is outstanding,
//! and the PID is cleared once the child has been reaped, so a stale
//! identifier can never be signaled twice.

use chrono::{DateTime, Utc};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use tunman_common::{ProcessError, ProcessResult};
use tunman_process::{launch, process_exists, terminate, LaunchRequest};

/// Tunnel session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No tunnel process outstanding.
    Stopped,
    /// Tunnel process launched and not yet asked to stop.
    Running,
    /// Termination requested; the process has not been confirmed reaped.
    Stopping,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Stopped => write!(f, "stopped"),
            SessionState::Running => write!(f, "running"),
            SessionState::Stopping => write!(f, "stopping"),
        }
    }
}

impl SessionState {
    /// Check if a transition to `target` is valid.
    pub fn is_valid_transition(self, target: SessionState) -> bool {
        match (self, target) {
            (SessionState::Stopped, SessionState::Running) => true,
            (SessionState::Running, SessionState::Stopping) => true,
            (SessionState::Stopping, SessionState::Stopped) => true,
            // Same state is a no-op.
            (state, target) if state == target => true,
            _ => false,
        }
    }
}

/// A single tunnel session: one launch, one termination.
///
/// Not internally synchronized; a session is owned by one caller at a
/// time, matching the one-in-flight-termination rule of the primitives.
pub struct TunnelSession {
    request: LaunchRequest,
    state: SessionState,
    pid: Option<Pid>,
    started_at: Option<DateTime<Utc>>,
    last_transition: DateTime<Utc>,
}

impl TunnelSession {
    pub fn new(request: LaunchRequest) -> Self {
        Self {
            request,
            state: SessionState::Stopped,
            pid: None,
            started_at: None,
            last_transition: Utc::now(),
        }
    }

    /// Launch the tunnel process for this session.
    ///
    /// # Errors
    ///
    /// `OperationNotAllowed` unless the session is `Stopped`; otherwise
    /// the launch errors of [`tunman_process::launch`].
    pub fn start(&mut self) -> ProcessResult<Pid> {
        if self.state != SessionState::Stopped {
            return Err(ProcessError::operation_not_allowed(
                "start",
                self.state.to_string(),
            ));
        }

        let pid = launch(&self.request)?;
        self.pid = Some(pid);
        self.started_at = Some(Utc::now());
        self.transition_to(SessionState::Running)?;
        Ok(pid)
    }

    /// Stop the tunnel process, escalating to a forced kill on timeout.
    ///
    /// On success the PID is cleared and the session returns to `Stopped`.
    /// If the termination signal could not be delivered the session stays
    /// in `Stopping` with the PID retained, and `stop` may be retried.
    pub fn stop(&mut self) -> ProcessResult<()> {
        let pid = match (self.state, self.pid) {
            (SessionState::Running, Some(pid)) | (SessionState::Stopping, Some(pid)) => pid,
            _ => {
                return Err(ProcessError::operation_not_allowed(
                    "stop",
                    self.state.to_string(),
                ));
            }
        };

        self.transition_to(SessionState::Stopping)?;
        terminate(pid)?;

        self.pid = None;
        self.started_at = None;
        self.transition_to(SessionState::Stopped)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn last_transition(&self) -> DateTime<Utc> {
        self.last_transition
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Whether the launched process currently exists. Diagnostic only;
    /// the session does not react to an exit it observes here.
    pub fn is_alive(&self) -> bool {
        match self.pid {
            Some(pid) => process_exists(pid).unwrap_or(false),
            None => false,
        }
    }

    fn transition_to(&mut self, target: SessionState) -> ProcessResult<()> {
        if !self.state.is_valid_transition(target) {
            return Err(ProcessError::operation_not_allowed(
                format!("transition to {target}"),
                self.state.to_string(),
            ));
        }
        debug!(from = %self.state, to = %target, "session state transition");
        self.state = target;
        self.last_transition = Utc::now();
        Ok(())
    }
}
