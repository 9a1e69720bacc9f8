//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using
//! clap's derive macros. It is purely declarative with no side effects
//! or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Eventgate -- control client for the ingest daemon.
///
/// Use `eventgate <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "eventgate", version, about, long_about = None)]
pub struct Cli {
    /// Path to the daemon API socket.
    #[arg(short, long, global = true, default_value = "/run/eventgate/api")]
    pub socket: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the daemon is alive.
    Ping,

    /// Show queue statistics and daemon uptime.
    Status,

    /// Send a raw framed request and print the raw response.
    Raw(RawArgs),
}

/// Send an arbitrary request payload.
#[derive(Args, Debug)]
pub struct RawArgs {
    /// Request payload, sent verbatim inside one frame.
    #[arg(short, long)]
    pub payload: String,
}
