//! MySQL connection settings for mutex sessions.

use std::fmt;
use std::time::Duration;

use db_mutex_core::error::{MutexError, MutexResult};
use sqlx::mysql::MySqlConnectOptions;

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 3306;
/// Connect timeout used when none is configured, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;
/// Upper bound for the connect timeout, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 120;

/// Settings for opening a MySQL session that holds named locks.
///
/// Only `host` is required. The connect timeout is clamped to
/// `0..=MAX_TIMEOUT_SECS`; zero disables the connect deadline.
#[derive(Clone, PartialEq, Eq)]
pub struct MySqlMutexConfig {
    host: String,
    port: u16,
    username: String,
    password: String,
    timeout_secs: u64,
}

impl MySqlMutexConfig {
    /// Creates a configuration for `host` with every other setting at its default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the user name.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Sets the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Sets the connect timeout in seconds, clamped to `0..=MAX_TIMEOUT_SECS`.
    pub fn timeout_secs(mut self, secs: i64) -> Self {
        self.timeout_secs = secs.clamp(0, MAX_TIMEOUT_SECS as i64) as u64;
        self
    }

    /// Reads the configuration from the environment.
    ///
    /// `MYSQL_HOST` is required; `MYSQL_PORT`, `MYSQL_USERNAME`, `MYSQL_PASSWORD`
    /// and `MYSQL_TIMEOUT` are optional.
    pub fn from_env() -> MutexResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MutexResult<Self> {
        let host = lookup("MYSQL_HOST")
            .filter(|host| !host.is_empty())
            .ok_or_else(|| MutexError::InvalidConfig("missing host config param".to_string()))?;
        let mut config = Self::new(host);

        if let Some(port) = lookup("MYSQL_PORT") {
            let port = port
                .parse()
                .map_err(|_| MutexError::InvalidConfig(format!("invalid port '{}'", port)))?;
            config = config.port(port);
        }
        if let Some(username) = lookup("MYSQL_USERNAME") {
            config = config.username(username);
        }
        if let Some(password) = lookup("MYSQL_PASSWORD") {
            config = config.password(password);
        }
        // Unparseable timeouts fall back to the default.
        if let Some(timeout) = lookup("MYSQL_TIMEOUT").and_then(|t| t.trim().parse::<i64>().ok()) {
            config = config.timeout_secs(timeout);
        }

        Ok(config)
    }

    pub fn get_host(&self) -> &str {
        &self.host
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    /// The connect deadline, `None` when disabled.
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Builds sqlx connect options from this configuration.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username);
        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

impl fmt::Debug for MySqlMutexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlMutexConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
