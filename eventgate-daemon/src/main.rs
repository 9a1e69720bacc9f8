use anyhow::Result;
use clap::Parser;

use eventgate_core::config::EventgateConfig;
use eventgate_daemon::bootstrap::Daemon;
use eventgate_daemon::cli::DaemonCli;
use eventgate_daemon::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    let mut config = EventgateConfig::load(&args.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", args.config.display(), e))?;

    // CLI flags take precedence over config file and environment
    if let Some(log_level) = args.log_level {
        config.general.log_level = log_level;
    }
    if let Some(log_format) = args.log_format {
        config.general.log_format = log_format;
    }
    if let Some(pid_file) = args.pid_file {
        config.general.pid_file = pid_file;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    if args.validate {
        println!("configuration OK: {}", args.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        config = %args.config.display(),
        event_socket = %config.server.event_socket,
        api_socket = %config.server.api_socket,
        "eventgate-daemon starting"
    );

    Daemon::build(config)?.run().await
}
