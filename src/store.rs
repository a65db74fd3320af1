//! Persistence collaborator for derived entities.
//!
//! The indexer only ever awaits one store call at a time, so
//! implementations need no coordination beyond what their backend
//! already provides.

use async_trait::async_trait;

use crate::entity::{Entity, EntityKey};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed to (de)serialize entity {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Stored entity {key} has kind {found}")]
    KindMismatch { key: EntityKey, found: String },
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn load(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError>;

    /// Inserts or replaces the entity under its own key. Durable once this
    /// returns.
    async fn save(&self, entity: Entity) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: EntityStore + ?Sized> EntityStore for std::sync::Arc<S> {
    async fn load(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        (**self).load(key).await
    }

    async fn save(&self, entity: Entity) -> Result<(), StoreError> {
        (**self).save(entity).await
    }
}
