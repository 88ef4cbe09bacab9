//! Stores whose system of record is the cache.
//!
//! Short-lived call-scoped state (external media sessions, AMD results,
//! DTMF buffers) never touches SQL. A miss is `NotFound` and cache failures
//! are reported as `RepositoryError::Cache`.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use dbhandler_core::cache::{deserialize_record, record_key, serialize_record, Cache};
use dbhandler_core::storage::{RepositoryError, Result};
use dbhandler_core::Keyed;

use super::coordinator::not_found;

/// Cache-backed store for one value type.
pub struct CacheOnlyStore<K, C = dyn Cache>
where
    K: Keyed,
    C: Cache + ?Sized,
{
    cache: Arc<C>,
    ttl: Option<Duration>,
    _marker: PhantomData<fn() -> K>,
}

impl<K, C> Clone for CacheOnlyStore<K, C>
where
    K: Keyed,
    C: Cache + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
            _marker: PhantomData,
        }
    }
}

impl<K, C> CacheOnlyStore<K, C>
where
    K: Keyed,
    C: Cache + ?Sized,
{
    pub fn new(cache: Arc<C>, ttl: Option<Duration>) -> Self {
        Self {
            cache,
            ttl,
            _marker: PhantomData,
        }
    }

    /// Writes (or overwrites) the value's slot.
    pub async fn set(&self, value: &K) -> Result<()> {
        let bytes = serialize_record(value).map_err(|e| RepositoryError::Marshal(e.to_string()))?;

        self.cache
            .set(&record_key::<K>(value.id()), &bytes, self.ttl)
            .await
            .map_err(|e| RepositoryError::Cache(e.to_string()))?;

        tracing::debug!(entity = K::ENTITY_TYPE, id = %value.id(), "Cache-only value stored");
        Ok(())
    }

    /// Reads the value, `None` on a miss.
    pub async fn find(&self, id: &K::Id) -> Result<Option<K>> {
        let bytes = self
            .cache
            .get(&record_key::<K>(id))
            .await
            .map_err(|e| RepositoryError::Cache(e.to_string()))?;

        bytes
            .map(|bytes| deserialize_record(&bytes).map_err(|e| RepositoryError::Scan(e.to_string())))
            .transpose()
    }

    /// Reads the value; a miss is `NotFound`.
    pub async fn get(&self, id: &K::Id) -> Result<K> {
        self.find(id).await?.ok_or_else(|| not_found::<K>(id))
    }

    /// Removes the value. Removing a missing value is not an error.
    pub async fn delete(&self, id: &K::Id) -> Result<()> {
        self.cache
            .delete(&record_key::<K>(id))
            .await
            .map_err(|e| RepositoryError::Cache(e.to_string()))?;

        tracing::debug!(entity = K::ENTITY_TYPE, %id, "Cache-only value deleted");
        Ok(())
    }
}
