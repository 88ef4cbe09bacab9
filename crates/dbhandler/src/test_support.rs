//! Fixtures shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone, Utc};

use dbhandler_core::cache::{Cache, CacheError, Result};
use dbhandler_core::time::SteppingClock;

use crate::storage::sqlite::Database;

/// In-memory database whose clock starts at 2024-01-01 and advances 1ms per read.
pub async fn stepping_database() -> Database {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid start instant");
    Database::open_in_memory()
        .await
        .expect("in-memory database")
        .with_clock(Arc::new(SteppingClock::new(start, TimeDelta::milliseconds(1))))
}

/// Cache that accepts every write and never returns anything.
#[derive(Debug, Default)]
pub struct AlwaysMissCache {
    pub sets: AtomicUsize,
}

#[async_trait]
impl Cache for AlwaysMissCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Option<Duration>) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

/// Cache whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl Cache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(CacheError::ConnectionFailed("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Option<Duration>) -> Result<()> {
        Err(CacheError::ConnectionFailed("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(CacheError::ConnectionFailed("connection refused".to_string()))
    }
}
