//! Core traits for database-backed named mutexes.

use std::future::Future;
use std::time::Duration;

use crate::error::MutexResult;
use crate::timeout::WaitTimeout;

// ============================================================================
// Named Mutex Trait
// ============================================================================

/// A mutual exclusion lock identified by name and held by a database session.
///
/// Holding the lock is tied to the connection that acquired it, not to the
/// process or thread. Calls take `&mut self`; a mutex is never shared between
/// tasks without external synchronization.
///
/// # Example
///
/// ```rust,ignore
/// let mut mutex = provider.create_mutex("nightly-report");
///
/// if mutex.lock(Duration::from_secs(5)).await? {
///     build_report().await?;
///     mutex.unlock().await?;
/// }
/// ```
pub trait NamedMutex: Send {
    /// Returns the name identifying this mutex.
    fn name(&self) -> &str;

    /// Returns `true` while this mutex believes it holds the lock.
    fn is_locked(&self) -> bool;

    /// Acquires the lock, waiting up to `wait`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Lock acquired, or already held by this mutex
    /// * `Ok(false)` - Lock held elsewhere and the wait elapsed
    /// * `Err(MutexError::MutexFailure)` - The server returned an unexpected result
    /// * `Err(MutexError::Transport)` - The connection failed
    fn lock(&mut self, wait: Duration) -> impl Future<Output = MutexResult<bool>> + Send;

    /// Releases the lock.
    ///
    /// Returns `Ok(false)` without touching the server when the lock is not held,
    /// and `Ok(false)` when the server reports the lock was not held by this session.
    fn unlock(&mut self) -> impl Future<Output = MutexResult<bool>> + Send;

    /// Attempts to acquire the lock without waiting.
    fn try_lock(&mut self) -> impl Future<Output = MutexResult<bool>> + Send {
        self.lock(Duration::ZERO)
    }
}

// ============================================================================
// Connection Traits
// ============================================================================

/// One database session able to take and release session-scoped named locks.
///
/// Both operations return the single scalar the server answered with, `None`
/// for SQL NULL or no row. Interpreting the scalar is up to the caller.
pub trait NamedLockConnection: Send + 'static {
    /// Runs the acquire-named-lock operation.
    fn get_lock(
        &mut self,
        name: &str,
        wait: WaitTimeout,
    ) -> impl Future<Output = MutexResult<Option<i64>>> + Send;

    /// Runs the release-named-lock operation.
    fn release_lock(&mut self, name: &str) -> impl Future<Output = MutexResult<Option<i64>>> + Send;

    /// Closes the session. Any lock still held is released by the server.
    fn close(self) -> impl Future<Output = MutexResult<()>> + Send;
}

/// Opens new [`NamedLockConnection`]s.
pub trait LockConnector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: NamedLockConnection;

    /// Short backend name recorded on lock spans, e.g. `"mysql"`.
    const BACKEND: &'static str;

    /// Opens a fresh connection.
    fn connect(&self) -> impl Future<Output = MutexResult<Self::Connection>> + Send;
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Factory for creating named mutexes.
///
/// Providers encapsulate backend configuration, allowing application code
/// to stay backend-agnostic.
pub trait MutexProvider: Send + Sync {
    /// The mutex type created by this provider.
    type Mutex: NamedMutex;

    /// Creates a mutex with the given name. No connection is opened yet.
    fn create_mutex(&self, name: &str) -> Self::Mutex;
}
