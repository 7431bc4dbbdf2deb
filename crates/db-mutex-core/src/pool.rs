//! Multi-lock mutexes sharing a bounded set of spare connections.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::error::MutexResult;
use crate::session::interpret_get_lock;
use crate::timeout::WaitTimeout;
use crate::traits::{LockConnector, NamedLockConnection, NamedMutex};

/// Default number of idle connections kept for reuse.
pub const DEFAULT_MAX_SPARE: usize = 2;

struct PoolState<K> {
    spare: VecDeque<K>,
    active: HashMap<String, K>,
    /// Names with a GET_LOCK in flight. Waiters are woken when the sender drops.
    pending: HashMap<String, watch::Receiver<()>>,
}

struct PoolInner<C: LockConnector> {
    connector: C,
    max_spare: usize,
    state: Mutex<PoolState<C::Connection>>,
}

impl<C: LockConnector> PoolInner<C> {
    fn state(&self) -> MutexGuard<'_, PoolState<C::Connection>> {
        // Bookkeeping stays consistent across a panic, so a poisoned guard is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hands a connection back to the spare set, or closes it when the set is full.
    async fn recycle(&self, connection: C::Connection) {
        let overflow = {
            let mut state = self.state();
            if state.spare.len() < self.max_spare {
                state.spare.push_back(connection);
                None
            } else {
                Some(connection)
            }
        };

        if let Some(connection) = overflow {
            debug!(max_spare = self.max_spare, "spare set full, closing connection");
            if let Err(e) = connection.close().await {
                warn!("failed to close surplus lock connection: {}", e);
            }
        }
    }
}

/// Marks a lock attempt as in flight; dropping it wakes any waiters.
struct Reservation<'a, C: LockConnector> {
    inner: &'a PoolInner<C>,
    name: &'a str,
    _done: watch::Sender<()>,
}

impl<C: LockConnector> Drop for Reservation<'_, C> {
    fn drop(&mut self) {
        self.inner.state().pending.remove(self.name);
    }
}

/// Named mutexes for many names, sharing connections.
///
/// Each held lock pins one connection in the active map. Released connections
/// go back to a FIFO spare set of at most `max_spare` entries; connections past
/// that capacity are closed. New connections are opened only when no spare is
/// available.
///
/// The pool is cheap to clone and may be shared between tasks. Its bookkeeping
/// is guarded by a short critical section that never spans a server round trip.
pub struct LockPool<C: LockConnector> {
    inner: Arc<PoolInner<C>>,
}

impl<C: LockConnector> Clone for LockPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: LockConnector> LockPool<C> {
    /// Creates a pool keeping at most `max_spare` idle connections.
    pub fn new(connector: C, max_spare: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                connector,
                max_spare,
                state: Mutex::new(PoolState {
                    spare: VecDeque::with_capacity(max_spare),
                    active: HashMap::new(),
                    pending: HashMap::new(),
                }),
            }),
        }
    }

    /// Returns the configured spare capacity.
    pub fn max_spare(&self) -> usize {
        self.inner.max_spare
    }

    /// Number of idle connections waiting for reuse.
    pub fn spare_count(&self) -> usize {
        self.inner.state().spare.len()
    }

    /// Number of locks currently held through this pool.
    pub fn active_count(&self) -> usize {
        self.inner.state().active.len()
    }

    /// Returns `true` if this pool holds the lock `name`.
    pub fn is_locked(&self, name: &str) -> bool {
        self.inner.state().active.contains_key(name)
    }

    /// Returns a [`NamedMutex`] handle for `name` backed by this pool.
    pub fn mutex(&self, name: impl Into<String>) -> PooledMutex<C> {
        PooledMutex {
            pool: self.clone(),
            name: name.into(),
        }
    }

    /// Acquires `name`, waiting up to `wait`.
    ///
    /// Returns `Ok(true)` immediately if this pool already holds `name`. While
    /// another caller's attempt on `name` is in flight, this call waits for it
    /// and returns `Ok(true)` if it succeeded; otherwise it makes its own attempt.
    #[instrument(skip(self), fields(lock.name = %name, wait = ?wait, backend = C::BACKEND, max_spare = self.inner.max_spare))]
    pub async fn lock(&self, name: &str, wait: Duration) -> MutexResult<bool> {
        let (_reservation, spare) = loop {
            let mut in_flight = {
                let mut state = self.inner.state();
                if state.active.contains_key(name) {
                    return Ok(true);
                }
                match state.pending.get(name).cloned() {
                    Some(in_flight) => in_flight,
                    None => {
                        let (done, in_flight) = watch::channel(());
                        state.pending.insert(name.to_string(), in_flight);
                        let reservation = Reservation {
                            inner: &self.inner,
                            name,
                            _done: done,
                        };
                        break (reservation, state.spare.pop_front());
                    }
                }
            };
            debug!("lock attempt already in flight, waiting for it");
            // Resolves once the other attempt drops its reservation.
            let _ = in_flight.changed().await;
        };

        let mut connection = match spare {
            Some(connection) => connection,
            None => {
                debug!("no spare connection, opening a new one");
                self.inner.connector.connect().await?
            }
        };

        // A failing round trip drops the connection: its session state is unknown.
        let result = connection.get_lock(name, WaitTimeout::from(wait)).await?;
        let acquired = match interpret_get_lock(name, result) {
            Ok(acquired) => acquired,
            Err(e) => {
                if let Err(close_err) = connection.close().await {
                    warn!("failed to close lock connection: {}", close_err);
                }
                return Err(e);
            }
        };
        debug!(acquired, "GET_LOCK answered");

        if !acquired {
            self.inner.recycle(connection).await;
            return Ok(false);
        }

        self.inner.state().active.insert(name.to_string(), connection);
        Ok(true)
    }

    /// Attempts to acquire `name` without waiting.
    pub async fn try_lock(&self, name: &str) -> MutexResult<bool> {
        self.lock(name, Duration::ZERO).await
    }

    /// Releases `name`.
    ///
    /// Returns `Ok(false)` without touching the server when the pool does not
    /// hold `name`. The connection goes back to the spare set whatever the
    /// server answers; a transport error drops it instead.
    #[instrument(skip(self), fields(lock.name = %name, backend = C::BACKEND))]
    pub async fn unlock(&self, name: &str) -> MutexResult<bool> {
        let checked_out = self.inner.state().active.remove(name);
        let Some(mut connection) = checked_out else {
            return Ok(false);
        };

        let result = connection.release_lock(name).await?;
        debug!(?result, "RELEASE_LOCK answered");
        self.inner.recycle(connection).await;
        Ok(result == Some(1))
    }
}

impl<C: LockConnector> fmt::Debug for LockPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("LockPool")
            .field("max_spare", &self.inner.max_spare)
            .field("spare", &state.spare.len())
            .field("active", &state.active.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A [`NamedMutex`] for one name, backed by a [`LockPool`].
pub struct PooledMutex<C: LockConnector> {
    pool: LockPool<C>,
    name: String,
}

impl<C: LockConnector> PooledMutex<C> {
    /// Returns the pool this mutex draws connections from.
    pub fn pool(&self) -> &LockPool<C> {
        &self.pool
    }
}

impl<C: LockConnector> NamedMutex for PooledMutex<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_locked(&self) -> bool {
        self.pool.is_locked(&self.name)
    }

    async fn lock(&mut self, wait: Duration) -> MutexResult<bool> {
        self.pool.lock(&self.name, wait).await
    }

    async fn unlock(&mut self) -> MutexResult<bool> {
        self.pool.unlock(&self.name).await
    }
}
