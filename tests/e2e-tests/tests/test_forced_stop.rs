//! A tunnel process that survives the graceful signal is force-killed
//! after the fixed poll budget and is still reaped.

use e2e_tests::{
    cleanup_test_dir, create_test_dir, open_tun_stand_in, tunstub_path, wait_for_file,
    write_stub_config,
};
use std::time::{Duration, Instant};
use tunman_process::{launch, process_exists, terminate, LaunchRequest};

#[test]
fn test_forced_stop() {
    let dir = create_test_dir("forced-stop");
    let tun_fd = open_tun_stand_in();
    let ready_path = dir.join("ready");
    let ack_path = dir.join("term-ack");

    let config_path = write_stub_config(
        &dir,
        &format!(
            "tun-fd: {}\nready-file: {}\nterm-ack-file: {}\nignore-term: true\n",
            tun_fd,
            ready_path.display(),
            ack_path.display()
        ),
    );

    let request = LaunchRequest::new(tunstub_path(), &config_path, tun_fd);
    let pid = launch(&request).expect("launch failed");

    assert!(
        wait_for_file(&ready_path, Duration::from_secs(10)),
        "stub never became ready"
    );

    let start = Instant::now();
    terminate(pid).expect("terminate failed");
    let elapsed = start.elapsed();
    println!("forced stop took {:?}", elapsed);

    // The full graceful budget (10 x 100ms) elapsed before escalation.
    assert!(
        elapsed >= Duration::from_millis(950),
        "terminate returned after only {:?}, forced phase cannot have run",
        elapsed
    );

    // SIGTERM was delivered first and deliberately ignored.
    assert!(ack_path.exists(), "stub never saw the graceful signal");

    // Force-killed and reaped; no zombie outstanding.
    assert!(!process_exists(pid).unwrap());

    cleanup_test_dir(&dir);
}
