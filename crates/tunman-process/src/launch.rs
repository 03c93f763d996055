//! Tunnel process launching with an inherited TUN descriptor.
//!
//! A high-level spawn API closes every non-standard descriptor before
//! replacing the process image, which would leave the child without the
//! already-open TUN device. The launcher therefore performs the
//! split/replace sequence itself: fork, clear `FD_CLOEXEC` on the one
//! descriptor that must survive, close everything else, then `exec` the
//! tunnel executable with its configuration path as the single argument.

use std::ffi::CString;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use nix::unistd::{fork, ForkResult, Pid};
use tracing::info;

use tunman_common::{ProcessError, ProcessResult};

use crate::validation::validate_request;

/// Exit status the child reports when image replacement fails.
///
/// After `exec` fails there is no channel back to the parent, so the child
/// terminates immediately with this status instead of continuing to run
/// launcher code in a half-replaced state.
pub const EXEC_FAILURE_STATUS: i32 = 127;

/// A request to launch the tunnel executable.
///
/// `tun_fd` is externally owned: it must be open for the duration of the
/// [`launch`] call. After launch returns, the child's copy of the
/// descriptor is independent of the caller's.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Path to the tunnel executable.
    pub executable: PathBuf,
    /// Path to the configuration file, passed as the sole argument.
    pub config: PathBuf,
    /// Already-open TUN descriptor to preserve across `exec`.
    pub tun_fd: RawFd,
}

impl LaunchRequest {
    pub fn new(executable: impl Into<PathBuf>, config: impl Into<PathBuf>, tun_fd: RawFd) -> Self {
        Self {
            executable: executable.into(),
            config: config.into(),
            tun_fd,
        }
    }
}

/// Launch the tunnel executable as a child process.
///
/// The child has `tun_fd` open at its original numeric value and
/// exec-inheritable, no other descriptor >= 3 open, stdin redirected from
/// `/dev/null`, and stdout/stderr inherited from the calling process.
///
/// Returns the child PID. The caller owns the returned handle and must
/// eventually pass it to [`crate::terminate`] exactly once so the child is
/// reaped.
///
/// # Errors
///
/// Fails synchronously only on invalid input or fork failure. A bad
/// executable path is not detected here: it surfaces as a fast child exit
/// with status [`EXEC_FAILURE_STATUS`], observable at reap time.
pub fn launch(request: &LaunchRequest) -> ProcessResult<Pid> {
    validate_request(request)?;

    // Copy both paths into owned C storage before the split. The child
    // image must not touch caller-managed string memory, so everything it
    // needs is materialized here, including the raw argv pointer array.
    let exe = path_to_cstring(&request.executable)?;
    let cfg = path_to_cstring(&request.config)?;
    let argv: [*const libc::c_char; 3] = [exe.as_ptr(), cfg.as_ptr(), std::ptr::null()];
    let tun_fd = request.tun_fd;

    // SAFETY: the child branch performs only async-signal-safe syscalls
    // (fcntl, close_range, close, open, dup2, execv, _exit) before the
    // image is replaced, and never allocates.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            info!(
                pid = child.as_raw(),
                executable = %request.executable.display(),
                tun_fd,
                "tunnel process launched"
            );
            Ok(child)
        }
        Ok(ForkResult::Child) => exec_tunnel_image(&argv, tun_fd),
        Err(e) => Err(ProcessError::fork_failed(e.desc())),
    }
}

fn path_to_cstring(path: &Path) -> ProcessResult<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| ProcessError::configuration(format!("path contains NUL byte: {:?}", path)))
}

/// Child-image setup and `exec`. Runs between `fork` and `execv`; only
/// async-signal-safe calls are permitted here.
fn exec_tunnel_image(argv: &[*const libc::c_char; 3], tun_fd: RawFd) -> ! {
    preserve_across_exec(tun_fd);
    close_descriptors_except(tun_fd);
    detach_stdin(tun_fd);

    // execv only returns on failure.
    unsafe {
        libc::execv(argv[0], argv.as_ptr());
        libc::_exit(EXEC_FAILURE_STATUS)
    }
}

/// Clear `FD_CLOEXEC` on `fd` so it survives image replacement. Other
/// descriptor flags are kept. Failure is left to surface at exec time.
fn preserve_across_exec(fd: RawFd) {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFD);
        if flags >= 0 {
            libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC);
        }
    }
}

/// Close every descriptor >= 3 except `keep`, presenting the new image
/// with a clean descriptor table. Descriptors 0/1/2 stay as inherited.
///
/// On Linux 5.9+ this is a pair of `close_range` calls around the kept
/// descriptor; otherwise an iterative `close` up to `sysconf(_SC_OPEN_MAX)`.
fn close_descriptors_except(keep: RawFd) {
    #[cfg(target_os = "linux")]
    {
        let keep_u = keep.max(0) as u32;
        let ret = unsafe {
            if keep > 3 {
                libc::syscall(libc::SYS_close_range, 3_u32, keep_u - 1, 0_u32);
            }
            // Clamped to 3 so a kept descriptor below the standard streams
            // can never pull them into the closed range.
            libc::syscall(libc::SYS_close_range, (keep_u + 1).max(3), u32::MAX, 0_u32)
        };
        if ret == 0 {
            return;
        }
    }

    let end = max_open_fd();
    for fd in 3..end {
        if fd != keep {
            unsafe {
                libc::close(fd);
            }
        }
    }
}

/// Upper bound on descriptor numbers from `sysconf(_SC_OPEN_MAX)`.
fn max_open_fd() -> RawFd {
    let n = unsafe { libc::sysconf(libc::_SC_OPEN_MAX) };
    if n > 0 {
        n as RawFd
    } else {
        1024
    }
}

/// Redirect stdin from `/dev/null`; the tunnel has no interactive input.
fn detach_stdin(tun_fd: RawFd) {
    const DEV_NULL: &[u8] = b"/dev/null\0";
    unsafe {
        let null_fd = libc::open(DEV_NULL.as_ptr().cast(), libc::O_RDWR);
        if null_fd >= 0 && null_fd != libc::STDIN_FILENO {
            libc::dup2(null_fd, libc::STDIN_FILENO);
            if null_fd != tun_fd {
                libc::close(null_fd);
            }
        }
    }
}
