//! CLI-specific error types and exit code mapping

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Cannot connect to the daemon API socket.
    #[error("daemon not reachable at '{socket}': {reason}")]
    DaemonUnavailable {
        /// Socket path that was tried.
        socket: String,
        /// Connection error detail.
        reason: String,
    },

    /// Wire-level failure while exchanging frames.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The daemon answered with its canned error response.
    #[error("daemon error: {0}")]
    Daemon(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::DaemonUnavailable { .. } => 2,
            CliError::Protocol(_) => 3,
            CliError::Daemon(_) => 4,
            CliError::JsonSerialize(_) | CliError::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let errors = [
            CliError::DaemonUnavailable {
                socket: "/run/eventgate/api".to_owned(),
                reason: "No such file or directory".to_owned(),
            },
            CliError::Protocol("zero-length frame".to_owned()),
            CliError::Daemon("unknown command".to_owned()),
            CliError::Io(std::io::Error::other("broken pipe")),
        ];
        let codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        for code in &codes {
            assert_ne!(*code, 0);
        }
        let mut unique = codes.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
    }
}
