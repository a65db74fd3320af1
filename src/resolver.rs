//! Typed load / load-or-create over an [`EntityStore`].

use tracing::debug;

use crate::entity::{EntityKey, Stored, ZeroValued};
use crate::store::{EntityStore, StoreError};

pub async fn load<A: Stored, S: EntityStore + ?Sized>(
    store: &S,
    id: &A::Id,
) -> Result<Option<A>, StoreError> {
    let key = A::key_for(id);

    let Some(entity) = store.load(&key).await? else {
        return Ok(None);
    };

    let found = entity.kind();
    A::from_entity(entity)
        .map(Some)
        .ok_or_else(|| StoreError::KindMismatch {
            key,
            found: found.to_string(),
        })
}

/// Returns the stored entity, or its zero value without persisting it.
/// Callers save the value once the event using it has been accepted.
pub async fn load_or_zero<A, S>(store: &S, id: &A::Id) -> Result<A, StoreError>
where
    A: ZeroValued,
    S: EntityStore + ?Sized,
{
    Ok(load::<A, S>(store, id)
        .await?
        .unwrap_or_else(|| A::zero(id)))
}

/// Returns the stored entity, or persists and returns its zero value when
/// none exists yet. Construction happens at most once per id.
pub async fn resolve<A, S>(store: &S, id: &A::Id) -> Result<A, StoreError>
where
    A: ZeroValued + Clone,
    S: EntityStore + ?Sized,
{
    if let Some(existing) = load::<A, S>(store, id).await? {
        return Ok(existing);
    }

    let created = A::zero(id);
    store.save(created.clone().into_entity()).await?;
    debug!(key = %A::key_for(id), "Created entity at zero value");

    Ok(created)
}

pub async fn save<A: Stored, S: EntityStore + ?Sized>(
    store: &S,
    entity: A,
) -> Result<(), StoreError> {
    store.save(entity.into_entity()).await
}

pub async fn exists<S: EntityStore + ?Sized>(
    store: &S,
    key: &EntityKey,
) -> Result<bool, StoreError> {
    Ok(store.load(key).await?.is_some())
}
