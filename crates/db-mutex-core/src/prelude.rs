//! Convenience prelude for named mutex types.

pub use crate::error::{MutexError, MutexResult};
pub use crate::helper::get_or_create;
pub use crate::pool::{LockPool, PooledMutex, DEFAULT_MAX_SPARE};
pub use crate::session::LockSession;
pub use crate::timeout::WaitTimeout;
pub use crate::traits::{LockConnector, MutexProvider, NamedLockConnection, NamedMutex};
