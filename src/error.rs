//! Error types for the CEC core

use thiserror::Error;

/// Result alias used by the library side of the crate
pub type CecResult<T> = Result<T, CecError>;

/// Errors surfaced by the adapter session
///
/// Parsing never fails: unrecognized or truncated frames are dropped. Only
/// the adapter boundary produces errors, and none of them are retried.
#[derive(Debug, Error)]
pub enum CecError {
    /// The outbound command channel is closed (writer task gone)
    #[error("CEC adapter is no longer accepting commands")]
    AdapterClosed,

    /// Reading from or writing to the adapter pipes failed
    #[error("CEC adapter I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The adapter process could not be started
    #[error("failed to spawn CEC adapter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The adapter process was spawned without the expected pipe
    #[error("CEC adapter {0} pipe is not available")]
    MissingPipe(&'static str),

    /// A session task panicked or was cancelled
    #[error("CEC session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
