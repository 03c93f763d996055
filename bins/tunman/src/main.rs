use anyhow::Result;
use clap::{Parser, Subcommand};
use nix::unistd::Pid;
use std::os::fd::RawFd;
use std::path::PathBuf;
use tracing::info;

use tunman_process::{launch, process_exists, terminate, LaunchRequest};

/// Tunnel process launcher and terminator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch the tunnel executable with an inherited TUN descriptor
    Run {
        /// Path to the tunnel executable
        #[arg(long, value_name = "FILE")]
        executable: PathBuf,

        /// Configuration file passed to the tunnel as its only argument
        #[arg(long, value_name = "FILE")]
        config: PathBuf,

        /// Already-open descriptor number to preserve across exec
        #[arg(long, value_name = "FD")]
        tun_fd: RawFd,
    },

    /// Stop a launched tunnel process (graceful, then forced on timeout)
    Stop {
        /// PID previously printed by `run`
        #[arg(long)]
        pid: i32,
    },

    /// Check whether a launched tunnel process still exists
    Status {
        /// PID previously printed by `run`
        #[arg(long)]
        pid: i32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(cli.debug);

    match cli.command {
        Command::Run {
            executable,
            config,
            tun_fd,
        } => {
            let request = LaunchRequest::new(executable, config, tun_fd);
            let pid = launch(&request)?;
            // The pid is the contract with whoever calls `stop` later.
            println!("{pid}");
        }
        Command::Stop { pid } => {
            terminate(Pid::from_raw(pid))?;
            info!(pid, "tunnel process stopped");
        }
        Command::Status { pid } => {
            let exists = process_exists(Pid::from_raw(pid))?;
            println!("{}", if exists { "running" } else { "not-running" });
        }
    }

    Ok(())
}

fn initialize_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}
