//! Stub tunnel executable for launcher/terminator testing.
//!
//! Honors the launch contract of the real tunnel binary: invoked as
//! `tunstub <config>`, where the YAML config describes the expected
//! inherited descriptor and the behaviors a test scenario needs
//! (descriptor reporting, signal acknowledgment, surviving SIGTERM,
//! timed exit).

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::io;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "tunstub")]
#[command(about = "Stub tunnel executable for process launcher testing", long_about = None)]
struct Args {
    /// YAML configuration file (the launch contract's single argument)
    config: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct StubConfig {
    /// Descriptor expected to be open and exec-inheritable. The stub
    /// exits with status 3 if it is not.
    tun_fd: Option<RawFd>,

    /// Write a descriptor report here during startup, before the async
    /// runtime opens descriptors of its own.
    fd_report: Option<PathBuf>,

    /// Written once the stub is operational (signal handler installed).
    ready_file: Option<PathBuf>,

    /// Written as soon as SIGTERM is received, before deciding whether
    /// to obey it.
    term_ack_file: Option<PathBuf>,

    /// Acknowledge but survive SIGTERM (exercises the forced-kill path).
    ignore_term: bool,

    /// 0 = exit right after setup; absent = run until signaled;
    /// N = run at most N seconds.
    run_secs: Option<u64>,

    /// Exit status for voluntary exit.
    exit_code: i32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .init();

    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config {}: {}", args.config.display(), e);
            std::process::exit(2);
        }
    };
    info!("Starting tunstub with config: {:?}", config);

    if let Some(fd) = config.tun_fd {
        if !fd_is_open(fd) {
            error!("Expected descriptor {} is not open", fd);
            std::process::exit(3);
        }
        info!("Inherited descriptor {} is open", fd);
    }

    // Descriptor state must be captured before the runtime starts: the
    // reactor opens epoll/event descriptors that are not part of the
    // inherited table under test.
    if let Some(path) = &config.fd_report {
        if let Err(e) = write_fd_report(path) {
            error!("Failed to write fd report {}: {}", path.display(), e);
            std::process::exit(2);
        }
        info!("Wrote fd report: {}", path.display());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    let code = runtime.block_on(run(config));
    info!("Tunstub stopped");
    std::process::exit(code);
}

async fn run(config: StubConfig) -> i32 {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");

    // Ready implies the handler above is installed, so a test that waits
    // for this file can signal without racing default signal disposition.
    if let Some(path) = &config.ready_file {
        if let Err(e) = atomic_write_text(path, "ready\n") {
            error!("Failed to write ready file {}: {}", path.display(), e);
            return 2;
        }
        info!("Wrote ready file: {}", path.display());
    }

    if config.run_secs == Some(0) {
        return config.exit_code;
    }

    let run_for = config
        .run_secs
        .map(Duration::from_secs)
        // Effectively forever; the launcher's terminator decides our fate.
        .unwrap_or(Duration::from_secs(60 * 60 * 24));
    let timer = tokio::time::sleep(run_for);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                if let Some(path) = &config.term_ack_file {
                    if let Err(e) = atomic_write_text(path, "ack\n") {
                        error!("Failed to write term ack file {}: {}", path.display(), e);
                    } else {
                        info!("Wrote term ack file: {}", path.display());
                    }
                }
                if config.ignore_term {
                    warn!("Configured to ignore SIGTERM, continuing");
                    continue;
                }
                break;
            }
            _ = &mut timer => {
                info!("Run duration reached, exiting");
                break;
            }
        }
    }

    config.exit_code
}

fn load_config(path: &Path) -> Result<StubConfig, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_yaml::from_str(&text).map_err(|e| e.to_string())
}

fn fd_is_open(fd: RawFd) -> bool {
    unsafe { libc::fcntl(fd, libc::F_GETFD) >= 0 }
}

/// One `fd=<n> cloexec=<bool>` line per open descriptor, plus a
/// `stdin=<target>` line with the link target of descriptor 0.
fn write_fd_report(path: &Path) -> io::Result<()> {
    let mut report = String::new();
    for fd in open_descriptors()? {
        report.push_str(&format!("fd={} cloexec={}\n", fd, fd_is_cloexec(fd)));
    }

    let stdin_target = fs::read_link("/proc/self/fd/0")
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    report.push_str(&format!("stdin={}\n", stdin_target));

    atomic_write_text(path, &report)
}

fn fd_is_cloexec(fd: RawFd) -> bool {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    flags >= 0 && (flags & libc::FD_CLOEXEC) != 0
}

/// Open descriptors of this process, sorted.
///
/// The directory handle used for the `/proc/self/fd` scan shows up in its
/// own listing; entries are revalidated after the scan handle is closed so
/// it drops back out.
fn open_descriptors() -> io::Result<Vec<RawFd>> {
    let mut fds = Vec::new();
    for entry in fs::read_dir("/proc/self/fd")? {
        let entry = entry?;
        if let Ok(name) = entry.file_name().into_string() {
            if let Ok(fd) = name.parse::<RawFd>() {
                fds.push(fd);
            }
        }
    }
    fds.sort_unstable();
    fds.retain(|&fd| fd_is_open(fd));
    Ok(fds)
}

fn atomic_write_text(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pid = std::process::id();
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp-{pid}"));

    fs::write(&tmp_path, contents)?;

    // `rename` is atomic when source and dest share a filesystem.
    fs::rename(&tmp_path, path)?;
    Ok(())
}
