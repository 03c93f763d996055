//! Invalid inputs are rejected before any process is created, both at the
//! typed API and at the integer host boundary.

use e2e_tests::open_tun_stand_in;
use nix::unistd::Pid;
use tunman_common::ProcessError;
use tunman_process::{launch, launch_raw, terminate, terminate_raw, LaunchRequest};

#[test]
fn test_empty_executable_rejected() {
    let tun_fd = open_tun_stand_in();
    let request = LaunchRequest::new("", "/tmp/cfg", tun_fd);

    let result = launch(&request);
    assert!(matches!(result, Err(ProcessError::Configuration { .. })));
}

#[test]
fn test_empty_config_rejected() {
    let tun_fd = open_tun_stand_in();
    let request = LaunchRequest::new("/bin/true", "", tun_fd);

    let result = launch(&request);
    assert!(matches!(result, Err(ProcessError::Configuration { .. })));
}

#[test]
fn test_raw_boundary_sentinels() {
    let tun_fd = open_tun_stand_in();

    assert_eq!(launch_raw("", "/tmp/cfg", tun_fd), -1);
    assert_eq!(launch_raw("/bin/true", "/tmp/cfg", -1), -1);
    assert_eq!(terminate_raw(0), -1);
    assert_eq!(terminate_raw(-42), -1);
}

#[test]
fn test_terminate_rejects_non_positive_pid() {
    assert!(matches!(
        terminate(Pid::from_raw(0)),
        Err(ProcessError::InvalidPid { .. })
    ));
    assert!(matches!(
        terminate(Pid::from_raw(-3)),
        Err(ProcessError::InvalidPid { .. })
    ));
}
