//! Framed request client for the daemon API socket.

use std::path::Path;

use bytes::Bytes;
use tokio::net::UnixStream;

use eventgate_server::protocol;

use crate::error::CliError;

/// Connect, send one framed request, and return the framed response.
pub async fn request(socket: &Path, payload: &[u8]) -> Result<Bytes, CliError> {
    let mut stream =
        UnixStream::connect(socket)
            .await
            .map_err(|e| CliError::DaemonUnavailable {
                socket: socket.display().to_string(),
                reason: e.to_string(),
            })?;

    protocol::write_frame(&mut stream, payload)
        .await
        .map_err(|e| CliError::Protocol(e.to_string()))?;

    match protocol::read_frame(&mut stream).await {
        Ok(Some(response)) => Ok(response),
        Ok(None) => Err(CliError::Protocol(
            "daemon closed the connection without answering".to_owned(),
        )),
        Err(e) => Err(CliError::Protocol(e.to_string())),
    }
}

/// Send a JSON command and interpret the daemon's `error` field.
///
/// A non-zero `error` (the canned busy/error responses) is reported as
/// [`CliError::Daemon`].
pub async fn json_command(socket: &Path, command: &str) -> Result<serde_json::Value, CliError> {
    let payload = serde_json::json!({ "command": command }).to_string();
    let response = request(socket, payload.as_bytes()).await?;

    let body: serde_json::Value = serde_json::from_slice(&response)
        .map_err(|e| CliError::Protocol(format!("malformed response: {e}")))?;

    match body.get("error").and_then(|e| e.as_i64()) {
        Some(0) => Ok(body),
        _ => {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unrecognized response");
            Err(CliError::Daemon(message.to_owned()))
        }
    }
}
