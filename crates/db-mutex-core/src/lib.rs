//! Core traits and types for database-backed named mutexes.
//!
//! A [`LockSession`] holds one named lock on its own connection; a [`LockPool`]
//! holds many names while reusing a bounded set of spare connections. Both
//! implement [`NamedMutex`], which [`get_or_create`] uses to make a
//! read-or-initialize sequence safe across processes.

pub mod error;
pub mod helper;
pub mod pool;
pub mod prelude;
pub mod session;
pub mod timeout;
pub mod traits;

pub use error::{MutexError, MutexResult};
pub use prelude::*;
