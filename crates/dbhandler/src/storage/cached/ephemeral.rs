//! Call-scoped values that live only in the cache.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use dbhandler_core::cache::Cache;
use dbhandler_core::models::{AmdResult, DtmfBuffer, ExternalMedia};
use dbhandler_core::storage::Result;

use super::cache_only::CacheOnlyStore;

/// External media sessions, keyed by their own id.
#[derive(Clone)]
pub struct ExternalMediaHandler {
    store: CacheOnlyStore<ExternalMedia>,
}

impl ExternalMediaHandler {
    pub fn new(cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self {
            store: CacheOnlyStore::new(cache, ttl),
        }
    }

    pub async fn set(&self, media: &ExternalMedia) -> Result<()> {
        self.store.set(media).await
    }

    pub async fn get(&self, id: Uuid) -> Result<ExternalMedia> {
        self.store.get(&id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete(&id).await
    }
}

/// Answering machine detection results, keyed by call id.
#[derive(Clone)]
pub struct AmdHandler {
    store: CacheOnlyStore<AmdResult>,
}

impl AmdHandler {
    pub fn new(cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self {
            store: CacheOnlyStore::new(cache, ttl),
        }
    }

    pub async fn set(&self, result: &AmdResult) -> Result<()> {
        self.store.set(result).await
    }

    pub async fn get(&self, call_id: Uuid) -> Result<AmdResult> {
        self.store.get(&call_id).await
    }

    pub async fn delete(&self, call_id: Uuid) -> Result<()> {
        self.store.delete(&call_id).await
    }
}

/// Unconsumed DTMF digits, keyed by call id.
#[derive(Clone)]
pub struct DtmfHandler {
    store: CacheOnlyStore<DtmfBuffer>,
}

impl DtmfHandler {
    pub fn new(cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self {
            store: CacheOnlyStore::new(cache, ttl),
        }
    }

    /// Current digits of the call. No buffer reads as empty.
    pub async fn get(&self, call_id: Uuid) -> Result<DtmfBuffer> {
        Ok(self
            .store
            .find(&call_id)
            .await?
            .unwrap_or_else(|| DtmfBuffer::empty(call_id)))
    }

    /// Appends `digits` to the call's buffer and returns the new buffer.
    ///
    /// Read-modify-write on the cache; concurrent appends on one call may
    /// lose digits.
    pub async fn append(&self, call_id: Uuid, digits: &str) -> Result<DtmfBuffer> {
        let mut buffer = self.get(call_id).await?;
        buffer.digits.push_str(digits);
        self.store.set(&buffer).await?;
        Ok(buffer)
    }

    pub async fn clear(&self, call_id: Uuid) -> Result<()> {
        self.store.delete(&call_id).await
    }
}
