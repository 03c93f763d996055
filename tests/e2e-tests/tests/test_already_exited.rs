//! Terminating a process that already exited on its own reaps it on the
//! first poll and reports success.

use e2e_tests::open_tun_stand_in;
use std::thread;
use std::time::{Duration, Instant};
use tunman_process::{launch, process_exists, terminate, LaunchRequest};

#[test]
fn test_terminate_after_voluntary_exit() {
    let tun_fd = open_tun_stand_in();

    // /bin/true ignores its config argument and exits 0 immediately.
    let request = LaunchRequest::new("/bin/true", "/tmp/cfg", tun_fd);
    let pid = launch(&request).expect("launch failed");
    assert!(pid.as_raw() > 0);

    // Give the child time to exit; it stays reapable until we collect it.
    thread::sleep(Duration::from_millis(200));

    let start = Instant::now();
    terminate(pid).expect("terminate failed");

    // Reaped on the first non-blocking poll, no sleeping involved.
    assert!(start.elapsed() < Duration::from_millis(100));
    assert!(!process_exists(pid).unwrap());
}
