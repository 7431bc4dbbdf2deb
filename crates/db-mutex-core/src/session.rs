//! Single-lock mutex owning one lazily opened connection.

use std::fmt;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::{MutexError, MutexResult};
use crate::timeout::WaitTimeout;
use crate::traits::{LockConnector, NamedLockConnection, NamedMutex};

/// A named mutex bound to one database session.
///
/// The connection is opened on the first [`lock`](NamedMutex::lock) call and
/// kept for the lifetime of the session. Dropping the session drops the
/// connection; the server then releases any lock it still held, but that is a
/// safety net only. Call [`unlock`](NamedMutex::unlock) to release.
pub struct LockSession<C: LockConnector> {
    name: String,
    connector: C,
    connection: Option<C::Connection>,
    held: bool,
}

impl<C: LockConnector> LockSession<C> {
    /// Creates a session for `name`. Nothing is sent to the server yet.
    pub fn new(name: impl Into<String>, connector: C) -> Self {
        Self {
            name: name.into(),
            connector,
            connection: None,
            held: false,
        }
    }

    /// Returns `true` once a connection has been opened.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

impl<C: LockConnector> NamedMutex for LockSession<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_locked(&self) -> bool {
        self.held
    }

    #[instrument(skip(self), fields(lock.name = %self.name, wait = ?wait, backend = C::BACKEND))]
    async fn lock(&mut self, wait: Duration) -> MutexResult<bool> {
        if self.held {
            return Ok(true);
        }

        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                debug!("opening connection for mutex");
                self.connector.connect().await?
            }
        };
        let connection = self.connection.insert(connection);

        let answered = connection.get_lock(&self.name, WaitTimeout::from(wait)).await;
        let result = match answered {
            Ok(result) => result,
            Err(e) => {
                // The session may be dead; reconnect on the next attempt.
                debug!("GET_LOCK failed, dropping connection: {}", e);
                self.connection = None;
                return Err(e);
            }
        };
        let acquired = interpret_get_lock(&self.name, result)?;
        debug!(acquired, "GET_LOCK answered");
        self.held = acquired;
        Ok(acquired)
    }

    #[instrument(skip(self), fields(lock.name = %self.name, backend = C::BACKEND))]
    async fn unlock(&mut self) -> MutexResult<bool> {
        if !self.held {
            return Ok(false);
        }
        // Cleared before the call so a failed release never leaves stale state.
        self.held = false;

        let Some(connection) = self.connection.as_mut() else {
            return Ok(false);
        };
        let result = connection.release_lock(&self.name).await?;
        debug!(?result, "RELEASE_LOCK answered");
        Ok(result == Some(1))
    }
}

impl<C: LockConnector> fmt::Debug for LockSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockSession")
            .field("name", &self.name)
            .field("held", &self.held)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

/// Maps the scalar answered by GET_LOCK: `1` acquired, `0` timed out, anything else fails.
pub(crate) fn interpret_get_lock(name: &str, result: Option<i64>) -> MutexResult<bool> {
    match result {
        Some(1) => Ok(true),
        Some(0) => Ok(false),
        result => Err(MutexError::MutexFailure {
            name: name.to_string(),
            result,
        }),
    }
}
