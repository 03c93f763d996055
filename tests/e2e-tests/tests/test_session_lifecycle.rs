//! Session layer: one launch paired with exactly one termination, with
//! misuse rejected instead of reaching the OS.

use e2e_tests::{
    cleanup_test_dir, create_test_dir, open_tun_stand_in, tunstub_path, wait_for_file,
    write_stub_config,
};
use std::time::Duration;
use tunman_common::ProcessError;
use tunman_process::LaunchRequest;
use tunman_session::{SessionState, TunnelSession};

#[test]
fn test_session_lifecycle() {
    let dir = create_test_dir("session-lifecycle");
    let tun_fd = open_tun_stand_in();
    let ready_path = dir.join("ready");

    let config_path = write_stub_config(
        &dir,
        &format!("tun-fd: {}\nready-file: {}\n", tun_fd, ready_path.display()),
    );

    let mut session = TunnelSession::new(LaunchRequest::new(tunstub_path(), &config_path, tun_fd));
    assert_eq!(session.state(), SessionState::Stopped);

    let pid = session.start().expect("start failed");
    assert!(pid.as_raw() > 0);
    assert_eq!(session.state(), SessionState::Running);
    assert!(
        wait_for_file(&ready_path, Duration::from_secs(10)),
        "stub never became ready"
    );
    assert!(session.is_alive());

    session.stop().expect("stop failed");
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.pid(), None);
    assert!(!session.is_alive());

    // The handle was consumed; a second stop is a usage error, not an
    // OS call against a stale pid.
    let result = session.stop();
    assert!(matches!(
        result,
        Err(ProcessError::OperationNotAllowed { .. })
    ));

    cleanup_test_dir(&dir);
}
