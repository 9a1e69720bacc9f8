//! CLI argument definitions for eventgate-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Eventgate security event ingest daemon.
///
/// Binds the local event and API sockets, runs the engine server,
/// and drains the event queue with a consumer thread pool.
#[derive(Parser, Debug)]
#[command(name = "eventgate-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to eventgate.toml configuration file.
    #[arg(short, long, default_value = "/etc/eventgate/eventgate.toml")]
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = DaemonCli::parse_from(["eventgate-daemon"]);
        assert_eq!(cli.config, PathBuf::from("/etc/eventgate/eventgate.toml"));
        assert!(cli.log_level.is_none());
        assert!(!cli.validate);
    }

    #[test]
    fn parses_overrides() {
        let cli = DaemonCli::parse_from([
            "eventgate-daemon",
            "--config",
            "/tmp/test.toml",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "--validate",
            "--pid-file",
            "/tmp/eventgate.pid",
        ]);
        assert_eq!(cli.config, PathBuf::from("/tmp/test.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("pretty"));
        assert!(cli.validate);
        assert_eq!(cli.pid_file.as_deref(), Some("/tmp/eventgate.pid"));
    }
}
