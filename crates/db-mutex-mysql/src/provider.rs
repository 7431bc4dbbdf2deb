//! MySQL mutex provider implementation.

use std::time::Duration;

use db_mutex_core::error::{MutexError, MutexResult};
use db_mutex_core::pool::{LockPool, DEFAULT_MAX_SPARE};
use db_mutex_core::session::LockSession;
use db_mutex_core::traits::MutexProvider;

use crate::config::MySqlMutexConfig;
use crate::connection::{MySqlConnectionSource, MySqlConnector};

/// A named mutex holding its lock on a dedicated MySQL session.
pub type MySqlMutex = LockSession<MySqlConnector>;

/// Many named mutexes sharing a bounded set of spare MySQL sessions.
pub type MySqlLockPool = LockPool<MySqlConnector>;

/// Builder for MySQL mutex provider configuration.
pub struct MySqlMutexProviderBuilder {
    source: Option<MySqlConnectionSource>,
    connect_timeout: Option<Duration>,
    statement_cache_capacity: Option<usize>,
    max_spare: usize,
}

impl MySqlMutexProviderBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            source: None,
            connect_timeout: Some(Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS)),
            statement_cache_capacity: None,
            max_spare: DEFAULT_MAX_SPARE,
        }
    }

    /// Sets the MySQL connection string.
    pub fn connection_string(mut self, conn_str: impl Into<String>) -> Self {
        self.source = Some(MySqlConnectionSource::ConnectionString(conn_str.into()));
        self
    }

    /// Sets discrete connection settings.
    pub fn config(mut self, config: MySqlMutexConfig) -> Self {
        self.source = Some(MySqlConnectionSource::Config(config));
        self
    }

    /// Sets the connect deadline used with a connection string.
    ///
    /// A [`MySqlMutexConfig`] carries its own timeout and ignores this value.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets how many prepared statements each connection keeps cached.
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = Some(capacity);
        self
    }

    /// Sets the spare capacity of pools created by [`MySqlMutexProvider::create_pool`].
    pub fn max_spare(mut self, max_spare: usize) -> Self {
        self.max_spare = max_spare;
        self
    }

    /// Builds the provider. No connection is opened until a mutex is locked.
    pub fn build(self) -> MutexResult<MySqlMutexProvider> {
        let source = self
            .source
            .ok_or_else(|| MutexError::InvalidConfig("connection not specified".to_string()))?;

        let (mut options, connect_timeout) = source.resolve(self.connect_timeout)?;
        if let Some(capacity) = self.statement_cache_capacity {
            options = options.statement_cache_capacity(capacity);
        }

        Ok(MySqlMutexProvider {
            connector: MySqlConnector::new(options, connect_timeout),
            max_spare: self.max_spare,
        })
    }
}

impl Default for MySqlMutexProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider for MySQL-backed named mutexes.
#[derive(Debug, Clone)]
pub struct MySqlMutexProvider {
    connector: MySqlConnector,
    max_spare: usize,
}

impl MySqlMutexProvider {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> MySqlMutexProviderBuilder {
        MySqlMutexProviderBuilder::new()
    }

    /// Creates a provider using the specified connection string.
    pub fn new(connection_string: impl Into<String>) -> MutexResult<Self> {
        Self::builder().connection_string(connection_string).build()
    }

    /// Creates a provider from discrete connection settings.
    pub fn from_config(config: MySqlMutexConfig) -> MutexResult<Self> {
        Self::builder().config(config).build()
    }

    /// Returns the connector every mutex of this provider opens sessions with.
    pub fn connector(&self) -> &MySqlConnector {
        &self.connector
    }

    /// Creates a pool with the provider's default spare capacity.
    pub fn create_pool(&self) -> MySqlLockPool {
        self.create_pool_with_capacity(self.max_spare)
    }

    /// Creates a pool keeping at most `max_spare` idle connections.
    pub fn create_pool_with_capacity(&self, max_spare: usize) -> MySqlLockPool {
        LockPool::new(self.connector.clone(), max_spare)
    }
}

impl MutexProvider for MySqlMutexProvider {
    type Mutex = MySqlMutex;

    fn create_mutex(&self, name: &str) -> Self::Mutex {
        LockSession::new(name, self.connector.clone())
    }
}
