//! The facade callers hold: every entity handler over one database and one cache.

use std::sync::Arc;
use std::time::Duration;

use dbhandler_core::cache::Cache;

use crate::cache::MemoryCache;
#[cfg(feature = "redis")]
use crate::cache::RedisCache;
use crate::config::Config;
use crate::storage::cached::{
    AccountHandler, AmdHandler, CallHandler, ChannelHandler, CustomerHandler, DtmfHandler,
    ExternalMediaHandler, QueueHandler, SipAuthHandler,
};
use crate::storage::sqlite::Database;

/// Shared data access for the whole platform.
///
/// Cheap to clone; clones share the database connection and the cache.
#[derive(Clone)]
pub struct DbHandler {
    pub accounts: AccountHandler,
    pub customers: CustomerHandler,
    pub queues: QueueHandler,
    pub calls: CallHandler,
    pub channels: ChannelHandler,
    pub sip_auths: SipAuthHandler,
    pub external_media: ExternalMediaHandler,
    pub amd: AmdHandler,
    pub dtmf: DtmfHandler,
}

impl DbHandler {
    /// Builds every handler over the same database and cache.
    pub fn new(
        db: Database,
        cache: Arc<dyn Cache>,
        ttl: Option<Duration>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            accounts: AccountHandler::new(db.clone(), cache.clone(), ttl),
            customers: CustomerHandler::new(db.clone(), cache.clone(), ttl),
            queues: QueueHandler::new(db.clone(), cache.clone(), ttl),
            calls: CallHandler::new(db.clone(), cache.clone(), ttl, poll_interval),
            channels: ChannelHandler::new(db.clone(), cache.clone(), ttl, poll_interval),
            sip_auths: SipAuthHandler::new(db, cache.clone(), ttl),
            external_media: ExternalMediaHandler::new(cache.clone(), ttl),
            amd: AmdHandler::new(cache.clone(), ttl),
            dtmf: DtmfHandler::new(cache, ttl),
        }
    }

    /// Opens the database and connects the cache named by `config`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let db = Database::open(&config.database_path).await?;
        tracing::info!(path = %config.database_path, "Database opened");

        let cache = connect_cache(config).await?;

        Ok(Self::new(db, cache, config.cache_ttl(), config.poll_interval()))
    }
}

/// Redis when `REDIS_URL` is set and the `redis` feature is on, otherwise the
/// in-process LRU.
async fn connect_cache(config: &Config) -> anyhow::Result<Arc<dyn Cache>> {
    if let Some(url) = &config.redis_url {
        if let Some(cache) = connect_redis(url).await? {
            return Ok(cache);
        }
    }

    tracing::info!(max_entries = config.cache_max_entries, "Using in-memory cache");
    Ok(Arc::new(MemoryCache::new(config.cache_max_entries)))
}

#[cfg(feature = "redis")]
async fn connect_redis(url: &str) -> anyhow::Result<Option<Arc<dyn Cache>>> {
    let cache = RedisCache::new(url).await?;
    tracing::info!(%url, "Using Redis cache");
    Ok(Some(Arc::new(cache)))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_url: &str) -> anyhow::Result<Option<Arc<dyn Cache>>> {
    tracing::warn!("REDIS_URL is set but the redis feature is disabled");
    Ok(None)
}
