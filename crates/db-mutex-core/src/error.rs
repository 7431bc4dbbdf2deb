//! Error types for named mutex operations.

use thiserror::Error;

/// Errors that can occur while locking, unlocking or coordinating on a named mutex.
#[derive(Error, Debug)]
pub enum MutexError {
    /// The lock service answered an acquire with neither success nor timeout.
    ///
    /// `result` is the scalar the server returned, `None` when it returned NULL or no row.
    #[error("failure on mutex '{name}' (GET_LOCK returned {result:?})")]
    MutexFailure { name: String, result: Option<i64> },

    /// The mutex could not be acquired within the wait and the caller needs it to proceed.
    #[error("unable to acquire lock on mutex '{0}'")]
    LockUnavailable(String),

    /// A release that was expected to succeed reported the lock as not held.
    #[error("unable to release lock on mutex '{0}'")]
    LockReleaseFailure(String),

    /// Error raised by the connection transport, passed through untouched.
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// Connection settings are missing or unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MutexError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// Result type for mutex operations.
pub type MutexResult<T> = Result<T, MutexError>;
