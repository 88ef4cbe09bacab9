//! Generic cache-aside coordinator.
//!
//! Storage is the system of record. Reads try the cache first and fall back
//! to storage; writes go to storage and then re-read the row so the slot
//! always holds storage's canonical version. Cache failures are logged and
//! swallowed on every path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use dbhandler_core::cache::{deserialize_record, record_key, secondary_key, serialize_record, Cache};
use dbhandler_core::storage::{EntityRepository, ListQuery, RecordId, RepositoryError, Result};
use dbhandler_core::{DeleteMode, Keyed, Record};

/// Builds the `NotFound` error for a record type.
pub(crate) fn not_found<K: Keyed>(id: impl ToString) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: K::ENTITY_TYPE,
        id: id.to_string(),
    }
}

/// Cache-aside coordinator over one entity repository.
///
/// # Type Parameters
///
/// * `E` - The storage repository of the entity
/// * `C` - The cache implementation (a trait object by default)
pub struct CacheAside<E, C = dyn Cache>
where
    E: EntityRepository,
    C: Cache + ?Sized,
{
    repository: Arc<E>,
    cache: Arc<C>,
    ttl: Option<Duration>,
}

impl<E, C> Clone for CacheAside<E, C>
where
    E: EntityRepository,
    C: Cache + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }
    }
}

impl<E, C> CacheAside<E, C>
where
    E: EntityRepository,
    C: Cache + ?Sized,
{
    /// Creates a coordinator. `ttl` of `None` keeps slots until evicted.
    pub fn new(repository: Arc<E>, cache: Arc<C>, ttl: Option<Duration>) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }

    /// The wrapped repository, for entity specific writes.
    pub fn repository(&self) -> &E {
        &self.repository
    }

    /// Returns the record from its slot, or from storage on a miss.
    pub async fn get(&self, id: &RecordId<E>) -> Result<E::Record> {
        let entity = <E::Record as Keyed>::ENTITY_TYPE;

        if let Some(record) = self.read_slot(&record_key::<E::Record>(id)).await {
            tracing::trace!(entity, %id, "Cache hit");
            return Ok(record);
        }

        tracing::trace!(entity, %id, "Cache miss");
        self.reload(id).await
    }

    /// Looks a record up through a secondary slot (`namespace:field:value`).
    ///
    /// The secondary slot only names the primary id and is written only here,
    /// from `fetch`'s answer. The record it resolves to must still carry the
    /// same secondary key, otherwise `fetch` is used.
    pub async fn get_by<F>(&self, field: &str, value: &str, fetch: F) -> Result<E::Record>
    where
        F: Future<Output = Result<Option<E::Record>>> + Send,
    {
        let entity = <E::Record as Keyed>::ENTITY_TYPE;
        let index_key = secondary_key(<E::Record as Keyed>::NAMESPACE, field, value);

        if let Some(id) = self.read_slot::<RecordId<E>>(&index_key).await {
            if let Some(record) = self
                .read_slot::<E::Record>(&record_key::<E::Record>(&id))
                .await
            {
                if record.secondary_keys().contains(&index_key) {
                    tracing::trace!(entity, field, value, "Cache hit");
                    return Ok(record);
                }
            }
        }

        tracing::trace!(entity, field, value, "Cache miss");
        let record = fetch.await?.ok_or_else(|| not_found::<E::Record>(value))?;
        self.store_record(&record).await;
        self.store_index(&index_key, record.id()).await;
        Ok(record)
    }

    /// Reads the record from storage and overwrites its slot.
    pub async fn reload(&self, id: &RecordId<E>) -> Result<E::Record> {
        let record = self
            .repository
            .fetch(id)
            .await?
            .ok_or_else(|| not_found::<E::Record>(id))?;

        self.store_record(&record).await;
        Ok(record)
    }

    /// Inserts the record and caches the version storage returns.
    pub async fn create(&self, record: &E::Record) -> Result<()> {
        self.repository.insert(record).await?;
        tracing::debug!(
            entity = <E::Record as Keyed>::ENTITY_TYPE,
            id = %record.id(),
            "Record created"
        );

        self.refresh(record.id()).await;
        Ok(())
    }

    /// Runs a storage write for `id`, then refreshes its slot.
    ///
    /// A failed write leaves the slot untouched.
    pub async fn update<T, F>(&self, id: &RecordId<E>, write: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let value = write.await?;
        tracing::debug!(
            entity = <E::Record as Keyed>::ENTITY_TYPE,
            %id,
            "Record updated"
        );

        self.refresh(id).await;
        Ok(value)
    }

    /// Soft deletes (and refreshes) or hard deletes (and evicts) the record.
    pub async fn delete(&self, id: &RecordId<E>) -> Result<()> {
        let entity = <E::Record as Keyed>::ENTITY_TYPE;

        match <E::Record as Record>::DELETE_MODE {
            DeleteMode::Soft => {
                self.repository.delete(id).await?;
                tracing::debug!(entity, %id, "Record soft deleted");
                self.refresh(id).await;
            }
            DeleteMode::Hard => {
                // Secondary keys are only known from the cached copy.
                let previous = self
                    .read_slot::<E::Record>(&record_key::<E::Record>(id))
                    .await;
                self.repository.delete(id).await?;
                tracing::debug!(entity, %id, "Record deleted");
                self.evict(id, previous.as_ref()).await;
            }
        }

        Ok(())
    }

    /// One page of records straight from storage.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<E::Record>> {
        self.repository.list(query).await
    }

    /// Re-reads `id` from storage into its slot, evicting it when the read
    /// fails or the row is gone.
    ///
    /// The secondary slots of the fresh record are dropped: the write may
    /// have changed which row a secondary lookup resolves to.
    pub async fn refresh(&self, id: &RecordId<E>) {
        let entity = <E::Record as Keyed>::ENTITY_TYPE;

        match self.repository.fetch(id).await {
            Ok(Some(record)) => {
                self.store_record(&record).await;
                self.drop_keys(record.secondary_keys()).await;
            }
            Ok(None) => self.evict(id, None).await,
            Err(err) => {
                tracing::warn!(entity, %id, error = %err, "Failed to re-read record, evicting slot");
                self.evict(id, None).await;
            }
        }
    }

    /// Removes the primary slot of `id` and the secondary slots of `previous`.
    pub async fn evict(&self, id: &RecordId<E>, previous: Option<&E::Record>) {
        let mut keys = vec![record_key::<E::Record>(id)];
        if let Some(record) = previous {
            keys.extend(record.secondary_keys());
        }

        self.drop_keys(keys).await;
    }

    async fn drop_keys(&self, keys: impl IntoIterator<Item = String>) {
        let entity = <E::Record as Keyed>::ENTITY_TYPE;

        for key in keys {
            if let Err(err) = self.cache.delete(&key).await {
                tracing::warn!(entity, key = %key, error = %err, "Failed to evict cache slot");
            }
        }
    }

    async fn read_slot<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entity = <E::Record as Keyed>::ENTITY_TYPE;

        match self.cache.get(key).await {
            Ok(Some(bytes)) => match deserialize_record(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    // Treated as a miss; the next write overwrites it.
                    tracing::warn!(entity, key, error = %err, "Cache slot deserialization failed");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(entity, key, error = %err, "Cache read failed");
                None
            }
        }
    }

    async fn store_record(&self, record: &E::Record) {
        let entity = <E::Record as Keyed>::ENTITY_TYPE;
        let id = record.id();

        let bytes = match serialize_record(record) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(entity, %id, error = %err, "Failed to serialize record for cache");
                return;
            }
        };

        if let Err(err) = self.cache.set(&record_key::<E::Record>(id), &bytes, self.ttl).await {
            tracing::warn!(entity, %id, error = %err, "Failed to cache record");
        }
    }

    async fn store_index(&self, index_key: &str, id: &RecordId<E>) {
        let entity = <E::Record as Keyed>::ENTITY_TYPE;

        let bytes = match serialize_record(id) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(entity, %id, error = %err, "Failed to serialize id for cache");
                return;
            }
        };

        if let Err(err) = self.cache.set(index_key, &bytes, self.ttl).await {
            tracing::warn!(entity, key = %index_key, error = %err, "Failed to cache secondary key");
        }
    }
}
