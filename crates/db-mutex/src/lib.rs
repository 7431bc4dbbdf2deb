//! Database-backed named mutexes for Rust.
//!
//! A named mutex is held by one database session: two processes asking for the
//! same name contend on the server, and the server drops the lock if the
//! holding session disconnects. On top of the mutex, [`get_or_create`] makes a
//! read-or-initialize sequence race-free across processes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use db_mutex::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MutexError> {
//!     let provider = MySqlMutexProvider::from_config(
//!         MySqlMutexConfig::new("localhost").username("root"),
//!     )?;
//!
//!     let mut mutex = provider.create_mutex("nightly-report");
//!
//!     if mutex.lock(Duration::from_secs(5)).await? {
//!         println!("Doing exclusive work...");
//!         mutex.unlock().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Get or create
//!
//! ```rust,ignore
//! let value = get_or_create(
//!     &mut provider.create_mutex("settings:tenant-7"),
//!     || async { store.find("tenant-7").await },
//!     || async { store.insert_defaults("tenant-7").await },
//!     Duration::from_secs(10),
//! )
//! .await?;
//! ```
//!
//! # Many names, few connections
//!
//! A [`LockPool`] holds any number of names while keeping at most `max_spare`
//! idle sessions around for reuse:
//!
//! ```rust,ignore
//! let pool = provider.create_pool_with_capacity(4);
//! pool.lock("tenant-1", Duration::ZERO).await?;
//! pool.lock("tenant-2", Duration::ZERO).await?;
//! pool.unlock("tenant-1").await?;
//! ```
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `db-mutex-core`: Core traits, sessions, pools and the coordinator
//! - `db-mutex-mysql`: MySQL backend
//!
//! For fine-grained control, you can depend on individual crates instead.

// Re-export core types and traits
pub use db_mutex_core::*;

// Re-export MySQL backend
pub use db_mutex_mysql::*;
