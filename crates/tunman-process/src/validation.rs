//! Launch request validation.
//!
//! Input problems are rejected here, before any OS resource is touched:
//! no fork is attempted for a request that fails validation.

use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::fcntl::{fcntl, FcntlArg};

use tunman_common::{ProcessError, ProcessResult};

use crate::launch::LaunchRequest;

/// Validate a launch request: both paths non-empty and NUL-free, and the
/// TUN descriptor open in the calling process.
pub fn validate_request(request: &LaunchRequest) -> ProcessResult<()> {
    validate_path("executable", &request.executable)?;
    validate_path("config", &request.config)?;
    validate_tun_fd(request.tun_fd)
}

fn validate_path(what: &str, path: &Path) -> ProcessResult<()> {
    if path.as_os_str().is_empty() {
        return Err(ProcessError::configuration(format!(
            "{what} path cannot be empty"
        )));
    }
    if path.as_os_str().as_bytes().contains(&0) {
        return Err(ProcessError::configuration(format!(
            "{what} path contains NUL byte"
        )));
    }
    Ok(())
}

fn validate_tun_fd(fd: RawFd) -> ProcessResult<()> {
    if fd < 0 {
        return Err(ProcessError::configuration(format!(
            "TUN descriptor cannot be negative: {fd}"
        )));
    }
    if !descriptor_is_open(fd) {
        return Err(ProcessError::configuration(format!(
            "TUN descriptor {fd} is not open in this process"
        )));
    }
    Ok(())
}

/// Whether `fd` is currently open, checked via `fcntl(F_GETFD)`.
pub fn descriptor_is_open(fd: RawFd) -> bool {
    fcntl(fd, FcntlArg::F_GETFD).is_ok()
}
