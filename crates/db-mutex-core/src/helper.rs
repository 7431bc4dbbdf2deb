//! Race-free get-or-create on top of a named mutex.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::MutexError;
use crate::traits::NamedMutex;

/// Looks a value up with `get`, creating it with `create` under `mutex` if absent.
///
/// `get` answers `Ok(None)` when the value does not exist. The lookup runs
/// once without the lock; if it finds nothing the mutex is acquired, the
/// lookup is repeated in case a concurrent caller created the value while we
/// waited, and only then is `create` invoked. `get` runs at most twice and
/// `create` at most once.
///
/// # Errors
///
/// * [`MutexError::LockUnavailable`] - the mutex was not acquired within `wait`
/// * [`MutexError::LockReleaseFailure`] - the value was obtained but the unlock
///   reported the lock as not held
/// * any error from `get` or `create`, returned as is; the mutex is still
///   released on a best-effort basis and a release failure is only logged
///
/// # Example
///
/// ```rust,ignore
/// let account = get_or_create(
///     &mut provider.create_mutex("account:42"),
///     || repo.find_account(42),
///     || repo.insert_account(42),
///     Duration::from_secs(5),
/// )
/// .await?;
/// ```
pub async fn get_or_create<M, T, E, G, GFut, C, CFut>(
    mutex: &mut M,
    mut get: G,
    create: C,
    wait: Duration,
) -> Result<T, E>
where
    M: NamedMutex,
    E: From<MutexError>,
    G: FnMut() -> GFut,
    GFut: Future<Output = Result<Option<T>, E>>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<T, E>>,
{
    if let Some(value) = get().await? {
        return Ok(value);
    }

    debug!(lock.name = %mutex.name(), "value not found, taking mutex");
    if !mutex.lock(wait).await? {
        return Err(MutexError::LockUnavailable(mutex.name().to_string()).into());
    }

    let outcome = match get().await {
        Ok(Some(value)) => Ok(value),
        Ok(None) => {
            debug!(lock.name = %mutex.name(), "still not found, creating");
            create().await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(value) => {
            if !mutex.unlock().await? {
                return Err(MutexError::LockReleaseFailure(mutex.name().to_string()).into());
            }
            Ok(value)
        }
        Err(e) => {
            match mutex.unlock().await {
                Ok(true) => {}
                Ok(false) => warn!(lock.name = %mutex.name(), "mutex was not held on release"),
                Err(unlock_err) => {
                    warn!(lock.name = %mutex.name(), "failed to release mutex: {}", unlock_err)
                }
            }
            Err(e)
        }
    }
}
