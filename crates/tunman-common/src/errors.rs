//! Error types for tunnel process supervision.
//!
//! Every fallible operation in the workspace returns [`ProcessResult`].
//! Failures are strictly return-value based: nothing in the launch or
//! termination paths panics, and no error crosses the fork boundary.

use thiserror::Error;

/// Process-specific error type for launch and termination operations.
#[derive(Error, Debug, Clone)]
pub enum ProcessError {
    /// Invalid input, rejected before any OS resource is touched.
    #[error("Invalid launch configuration: {reason}")]
    Configuration { reason: String },

    /// The OS refused to create a new process image. No process was
    /// created and no descriptor state was mutated.
    #[error("Fork failed: {reason}")]
    ForkFailed { reason: String },

    /// A termination signal could not be delivered.
    #[error("Failed to deliver {signal} to PID {pid}: {reason}")]
    SignalFailed {
        pid: i32,
        signal: &'static str,
        reason: String,
    },

    /// Exit-status collection failed for a process we signaled.
    #[error("Failed to reap PID {pid}: {reason}")]
    ReapFailed { pid: i32, reason: String },

    /// A process identifier outside the valid positive range.
    #[error("Invalid process identifier: {pid}")]
    InvalidPid { pid: i32 },

    /// The requested lifecycle operation is not legal in the current state.
    #[error("Operation not allowed: {operation} (state: {state})")]
    OperationNotAllowed { operation: String, state: String },
}

impl ProcessError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn fork_failed(reason: impl Into<String>) -> Self {
        Self::ForkFailed {
            reason: reason.into(),
        }
    }

    pub fn signal_failed(pid: i32, signal: &'static str, reason: impl Into<String>) -> Self {
        Self::SignalFailed {
            pid,
            signal,
            reason: reason.into(),
        }
    }

    pub fn reap_failed(pid: i32, reason: impl Into<String>) -> Self {
        Self::ReapFailed {
            pid,
            reason: reason.into(),
        }
    }

    pub fn invalid_pid(pid: i32) -> Self {
        Self::InvalidPid { pid }
    }

    pub fn operation_not_allowed(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Self::OperationNotAllowed {
            operation: operation.into(),
            state: state.into(),
        }
    }
}

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
