//! PostgreSQL key-value store
//!
//! Values live in a single `kv_store` table keyed by text. `set` is an
//! upsert, so the last writer wins.

use async_trait::async_trait;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, KeyValueStore, PortError};

use crate::error::{db_to_port_error, DatabaseError};
use crate::pool::DatabasePool;

/// PostgreSQL-backed implementation of the KeyValueStore port
///
/// Run [`crate::ensure_schema`] once before first use.
#[derive(Debug, Clone)]
pub struct PostgresKeyValueStore {
    pool: DatabasePool,
}

impl PostgresKeyValueStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Runs `SELECT 1` against the pool
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        Ok(())
    }
}

impl DomainPort for PostgresKeyValueStore {}

#[async_trait]
impl KeyValueStore for PostgresKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError> {
        let value = sqlx::query_scalar::<_, Vec<u8>>("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_to_port_error(DatabaseError::from(&e)))?;
        debug!(found = value.is_some(), "kv get");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| db_to_port_error(DatabaseError::from(&e)))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<(), PortError> {
        sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| db_to_port_error(DatabaseError::from(&e)))?;
        Ok(())
    }
}
