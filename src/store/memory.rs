use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{EntityStore, StoreError};
use crate::entity::{Entity, EntityKey};

/// In-process store. Counts writes so tests can assert how many times an
/// entity was persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: Mutex<HashMap<EntityKey, Entity>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        match self.entities.lock() {
            Ok(guard) => guard.len(),
            Err(poison) => poison.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        let entity = match self.entities.lock() {
            Ok(guard) => guard.get(key).cloned(),
            Err(poison) => poison.into_inner().get(key).cloned(),
        };

        Ok(entity)
    }

    async fn save(&self, entity: Entity) -> Result<(), StoreError> {
        let key = entity.key();

        match self.entities.lock() {
            Ok(mut guard) => guard.insert(key, entity),
            Err(poison) => poison.into_inner().insert(key, entity),
        };

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
