//! Storage Infrastructure Layer
//!
//! Adapters implementing [`core_kernel::KeyValueStore`] for the claims
//! services. Every domain service persists JSON blobs under fixed keys, so
//! the adapters only move bytes.
//!
//! - [`FileKeyValueStore`] - one file per key under a data directory
//! - [`PostgresKeyValueStore`] - a single `kv_store` table via SQLx
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, ensure_schema, DatabaseConfig, PostgresKeyValueStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims")).await?;
//! ensure_schema(&pool).await?;
//! let store = PostgresKeyValueStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod file_store;
pub mod postgres_store;

pub use pool::{DatabasePool, create_pool, ensure_schema, DatabaseConfig};
pub use error::{db_to_port_error, DatabaseError};
pub use file_store::FileKeyValueStore;
pub use postgres_store::PostgresKeyValueStore;
