use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::{EntityStore, StoreError};
use crate::entity::{Entity, EntityKey};

/// Entities stored as JSON bodies in the `entities` table, one row per
/// `(kind, id)`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of stored rows of each kind, ordered by kind.
    pub async fn count_by_kind(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT kind, COUNT(*) FROM entities GROUP BY kind ORDER BY kind")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    #[tracing::instrument(skip_all, fields(%key), level = tracing::Level::TRACE)]
    async fn load(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM entities WHERE kind = ? AND id = ?")
                .bind(key.kind.as_str())
                .bind(&key.id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((body,)) = row else {
            return Ok(None);
        };

        let entity = serde_json::from_str(&body).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;

        Ok(Some(entity))
    }

    #[tracing::instrument(skip_all, level = tracing::Level::TRACE)]
    async fn save(&self, entity: Entity) -> Result<(), StoreError> {
        let key = entity.key();
        let body = serde_json::to_string(&entity).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;

        sqlx::query(
            r#"
            INSERT INTO entities (kind, id, body)
            VALUES (?, ?, ?)
            ON CONFLICT (kind, id) DO UPDATE SET
                body = excluded.body,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key.kind.as_str())
        .bind(&key.id)
        .bind(body)
        .execute(&self.pool)
        .await?;

        debug!(%key, "Saved entity");
        Ok(())
    }
}
