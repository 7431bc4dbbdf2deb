//! MySQL backend for named mutexes.
//!
//! Uses MySQL's GET_LOCK and RELEASE_LOCK functions. Locks belong to the
//! session that took them and are released by the server when that session
//! ends.

pub mod config;
pub mod connection;
pub mod provider;

pub use config::MySqlMutexConfig;
pub use connection::{MySqlConnectionSource, MySqlConnector, MySqlLockConnection};
pub use provider::{MySqlLockPool, MySqlMutex, MySqlMutexProvider, MySqlMutexProviderBuilder};
