//! CLI argument definitions for gridbait-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Gridbait decoy network daemon.
///
/// Runs the decoy listeners and the alert relay, and manages their
/// lifecycles.
#[derive(Parser, Debug)]
#[command(name = "gridbait-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to gridbait.toml configuration file.
    #[arg(short, long, default_value = "/etc/gridbait/gridbait.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,

    /// Replay the entire event log through the relay once and exit.
    ///
    /// One-shot bootstrap/recovery mode: reprocesses the log from byte 0
    /// and overwrites the committed offset at the end.
    #[arg(long)]
    pub backfill: bool,
}
