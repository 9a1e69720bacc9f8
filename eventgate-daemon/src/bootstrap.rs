//! Daemon assembly and lifecycle management.
//!
//! [`Daemon`] is the central coordinator of `eventgate-daemon`. It
//! builds the event queue, wires the endpoints into an
//! [`EngineServer`], spawns the consumer thread pool, and runs the
//! main loop until a shutdown signal arrives.
//!
//! # Shutdown Order (intake first, drain last)
//!
//! 1. Engine server (stop accepting datagrams and API requests)
//! 2. Event queue (close, rejecting further pushes)
//! 3. Consumer pool (drain remaining events, then exit)

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use eventgate_core::config::EventgateConfig;
use eventgate_core::event::Event;
use eventgate_core::metrics as core_metrics;
use eventgate_server::endpoint::{DatagramEndpoint, Endpoint, StreamEndpoint};
use eventgate_server::{BoundedEventQueue, ConsumerPool, EngineServer, EventSink, RequestHandler};

/// Name of the datagram ingest endpoint (also the event source label).
const EVENT_ENDPOINT: &str = "event";
/// Name of the stream API endpoint.
const API_ENDPOINT: &str = "api";

/// Fully assembled daemon, ready to run.
pub struct Daemon {
    config: EventgateConfig,
    queue: BoundedEventQueue,
    server: EngineServer,
    start_time: Instant,
}

impl Daemon {
    /// Build the daemon from a validated configuration.
    ///
    /// Creates the queue (opening the flood file eagerly if one is
    /// configured) and registers both endpoints. Sockets are not bound
    /// until [`run`](Self::run).
    pub fn build(config: EventgateConfig) -> Result<Self> {
        let queue = if config.queue.flood_file.is_empty() {
            BoundedEventQueue::new(config.queue.capacity)
        } else {
            BoundedEventQueue::with_flood_file(
                config.queue.capacity,
                &config.queue.flood_file,
                config.queue.flood_attempts,
                Duration::from_millis(config.queue.flood_sleep_ms),
            )
            .map_err(|e| anyhow::anyhow!("cannot open flood file: {}", e))?
        };
        tracing::info!(
            capacity = config.queue.capacity,
            flood = queue.flood_enabled(),
            "event queue created"
        );

        let start_time = Instant::now();
        let mut server = EngineServer::new();
        server
            .add_endpoint(Endpoint::Datagram(DatagramEndpoint::new(
                EVENT_ENDPOINT,
                &config.server.event_socket,
                queue.clone(),
            )))
            .map_err(|e| anyhow::anyhow!("cannot register event endpoint: {}", e))?;
        server
            .add_endpoint(Endpoint::Stream(StreamEndpoint::new(
                API_ENDPOINT,
                &config.server.api_socket,
                api_handler(queue.clone(), start_time),
                Duration::from_millis(config.server.api_timeout_ms),
                config.server.api_queue_tasks,
            )))
            .map_err(|e| anyhow::anyhow!("cannot register api endpoint: {}", e))?;

        Ok(Self {
            config,
            queue,
            server,
            start_time,
        })
    }

    /// Run the daemon until a shutdown signal is received.
    ///
    /// Binds the sockets, starts the consumer pool, and blocks in the
    /// main loop. On SIGTERM/SIGINT the server is stopped, the queue
    /// is closed, and the consumers drain whatever is left before this
    /// method returns.
    pub async fn run(self) -> Result<()> {
        let Daemon {
            config,
            queue,
            mut server,
            start_time,
        } = self;

        core_metrics::describe_all();

        let pid_file = (!config.general.pid_file.is_empty())
            .then(|| Path::new(&config.general.pid_file).to_path_buf());
        if let Some(path) = &pid_file {
            write_pid_file(path)?;
        }

        let sink = logging_sink();
        let pool = match ConsumerPool::spawn(queue.clone(), sink, config.server.consumer_threads) {
            Ok(pool) => pool,
            Err(e) => {
                if let Some(path) = &pid_file {
                    remove_pid_file(path);
                }
                return Err(anyhow::anyhow!("cannot start consumer pool: {}", e));
            }
        };
        tracing::info!(
            threads = config.server.consumer_threads,
            "consumer pool started"
        );

        let handle = server.handle();
        let mut server_task = tokio::spawn(async move { server.start().await });

        let uptime_cancel = CancellationToken::new();
        let uptime_task = spawn_uptime_updater(start_time, uptime_cancel.clone());

        // Main loop: wait for a signal, or for the server to fail early.
        tracing::info!("eventgate-daemon running");
        let run_result = tokio::select! {
            signal = wait_for_shutdown_signal() => {
                match signal {
                    Ok(signal) => {
                        tracing::info!(signal = signal, "shutdown signal received");
                        handle.request_stop();
                        server_task
                            .await
                            .map_err(|e| anyhow::anyhow!("server task panicked: {}", e))?
                            .map_err(|e| anyhow::anyhow!("server failed during shutdown: {}", e))
                    }
                    Err(e) => {
                        handle.request_stop();
                        let _ = server_task.await;
                        Err(e)
                    }
                }
            }
            result = &mut server_task => {
                match result {
                    Ok(Ok(())) => Err(anyhow::anyhow!("server stopped unexpectedly")),
                    Ok(Err(e)) => Err(anyhow::anyhow!("server startup failed: {}", e)),
                    Err(e) => Err(anyhow::anyhow!("server task panicked: {}", e)),
                }
            }
        };

        uptime_cancel.cancel();
        let _ = uptime_task.await;

        // Close the queue and let the consumers drain the backlog.
        tracing::info!("draining event queue");
        queue.close();
        let drained = tokio::task::spawn_blocking(move || pool.join()).await;
        if drained.is_err() {
            tracing::error!("consumer pool join failed");
        }

        if let Some(path) = &pid_file {
            remove_pid_file(path);
        }
        tracing::info!("eventgate-daemon shut down");
        run_result
    }
}

/// Build the API request handler.
///
/// Requests are JSON objects with a `command` field:
///
/// * `ping` - liveness probe, answers `pong`
/// * `status` - queue statistics and daemon uptime
///
/// Unknown commands and malformed JSON produce an error, which the
/// endpoint turns into the canned error response.
pub fn api_handler(queue: BoundedEventQueue, start_time: Instant) -> RequestHandler {
    Arc::new(move |payload: Bytes| {
        let queue = queue.clone();
        Box::pin(async move {
            let request: serde_json::Value = serde_json::from_slice(&payload)
                .map_err(|e| format!("malformed request: {e}"))?;
            let command = request
                .get("command")
                .and_then(|c| c.as_str())
                .ok_or_else(|| "missing 'command' field".to_owned())?;

            let body = match command {
                "ping" => serde_json::json!({ "error": 0, "data": "pong" }),
                "status" => serde_json::json!({
                    "error": 0,
                    "data": {
                        "queue": queue.stats(),
                        "uptime_seconds": start_time.elapsed().as_secs(),
                    },
                }),
                other => return Err(format!("unknown command '{other}'")),
            };
            Ok(Bytes::from(body.to_string()))
        })
    })
}

/// Default event sink: log each consumed event.
///
/// Routing into the processing pipeline plugs in here once it exists;
/// until then consumed events are only surfaced in the debug log.
fn logging_sink() -> EventSink {
    Arc::new(|event: Event| {
        tracing::debug!(
            source = %event.metadata.source,
            size = event.len(),
            "event consumed"
        );
    })
}

/// Periodically publish the daemon uptime gauge.
fn spawn_uptime_updater(
    start_time: Instant,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = tick.tick() => {
                    metrics::gauge!(core_metrics::DAEMON_UPTIME_SECONDS)
                        .set(start_time.elapsed().as_secs_f64());
                }
            }
        }
    })
}

/// Wait for SIGTERM or SIGINT.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Write the daemon PID file.
///
/// Creates the parent directory with mode 0o700 if needed and the
/// file itself atomically with `create_new`, so a second daemon
/// instance fails instead of silently taking over the PID file.
fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    if let Some(parent) = path.parent() {
        use std::os::unix::fs::DirBuilderExt;
        let mut builder = fs::DirBuilder::new();
        builder.mode(0o700).recursive(true);
        builder.create(parent)?;
    }

    let pid = std::process::id();
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_owned());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let metadata = file.metadata()?;
    if !metadata.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file",
            path.display()
        ));
    }

    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    writeln!(file, "{}", pid)?;
    tracing::info!(pid = pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on daemon shutdown.
///
/// Logs a warning but does not fail if the file cannot be removed.
fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove PID file"
        );
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}
