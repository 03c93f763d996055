//! E2E test harness for the tunnel launcher and terminator.
//!
//! The scenarios exercise the real library against the `tunstub` binary:
//! launch with an inherited descriptor, observe the child's descriptor
//! table through the stub's report file, then drive the graceful/forced
//! termination paths.

use std::env;
use std::fs;
use std::os::fd::{IntoRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Path to the `tunstub` binary built alongside the test executables.
pub fn tunstub_path() -> PathBuf {
    let mut path = env::current_exe()
        .expect("Failed to get current exe path")
        .parent()
        .expect("Failed to get parent dir")
        .to_path_buf();

    // Test executables live in deps/, the stub one level up.
    if path.ends_with("deps") {
        path.pop();
    }

    path.push("tunstub");

    if !path.exists() {
        panic!(
            "tunstub binary not found at: {} (build the workspace first)",
            path.display()
        );
    }

    path
}

/// Create a per-test directory under `target/tmp`.
pub fn create_test_dir(test_name: &str) -> PathBuf {
    // Use target/tmp instead of system temp to avoid path issues
    let workspace_root = env::current_exe()
        .expect("Failed to get current exe path")
        .parent()
        .expect("Failed to get parent")
        .parent()
        .expect("Failed to get parent")
        .parent()
        .expect("Failed to get workspace root")
        .to_path_buf();

    let temp_dir = workspace_root
        .join("target")
        .join("tmp")
        .join(format!("e2e-test-{}", test_name));

    if temp_dir.exists() {
        fs::remove_dir_all(&temp_dir).ok();
    }
    fs::create_dir_all(&temp_dir).expect("Failed to create test directory");
    temp_dir
}

/// Clean up a test directory.
pub fn cleanup_test_dir(dir: &Path) {
    if dir.exists() {
        fs::remove_dir_all(dir).ok();
    }
}

/// Write a stub config file into the test directory and return its path.
pub fn write_stub_config(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("tunstub.yaml");
    fs::write(&path, yaml).expect("Failed to write stub config");
    path
}

/// Open a descriptor standing in for the TUN device.
///
/// Any open descriptor demonstrates the preservation mechanism; std opens
/// it with `FD_CLOEXEC` set, which is exactly the state the launcher must
/// clear in the child. Kept open for the life of the test process.
pub fn open_tun_stand_in() -> RawFd {
    fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .expect("Failed to open descriptor stand-in")
        .into_raw_fd()
}

/// Wait until `path` exists, up to `timeout`.
pub fn wait_for_file(path: &Path, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if path.exists() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    false
}

/// Wait for the stub's descriptor report and return its contents.
pub fn read_fd_report(path: &Path, timeout: Duration) -> Option<String> {
    if !wait_for_file(path, timeout) {
        return None;
    }
    fs::read_to_string(path).ok()
}
