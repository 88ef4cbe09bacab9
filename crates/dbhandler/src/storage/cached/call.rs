//! Calls, addressable by id or by the channel carrying them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use dbhandler_core::cache::Cache;
use dbhandler_core::models::{Call, CallStatus, HangupBy, HangupReason};
use dbhandler_core::storage::{ListQuery, Result};
use dbhandler_core::Keyed;

use super::coordinator::CacheAside;
use super::poll::poll_until;
use crate::storage::sqlite::{CallTransaction, Database, SqliteCallRepository};

/// Cached access to calls.
#[derive(Clone)]
pub struct CallHandler {
    calls: CacheAside<SqliteCallRepository>,
    poll_interval: Duration,
}

impl CallHandler {
    pub fn new(
        db: Database,
        cache: Arc<dyn Cache>,
        ttl: Option<Duration>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            calls: CacheAside::new(Arc::new(SqliteCallRepository::new(db)), cache, ttl),
            poll_interval,
        }
    }

    pub async fn create(&self, call: &Call) -> Result<()> {
        self.calls.create(call).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Call> {
        self.calls.get(&id).await
    }

    /// Newest call attached to `channel_id`.
    pub async fn get_by_channel_id(&self, channel_id: &str) -> Result<Call> {
        let repo = self.calls.repository();
        self.calls
            .get_by("channel_id", channel_id, repo.fetch_by_channel_id(channel_id))
            .await
    }

    /// Waits for a call that is being created elsewhere.
    pub async fn get_until_timeout(&self, id: Uuid, timeout: Duration) -> Result<Call> {
        let calls = &self.calls;
        poll_until(
            Call::ENTITY_TYPE,
            &id.to_string(),
            timeout,
            self.poll_interval,
            || async move { calls.get(&id).await },
            |_| true,
        )
        .await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Call>> {
        self.calls.list(query).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.calls.delete(&id).await
    }

    pub async fn set_bridge_id(&self, id: Uuid, bridge_id: &str) -> Result<()> {
        let repo = self.calls.repository();
        self.calls.update(&id, repo.set_bridge_id(id, bridge_id)).await
    }

    pub async fn set_status(&self, id: Uuid, status: CallStatus) -> Result<()> {
        let repo = self.calls.repository();
        self.calls.update(&id, repo.set_status(id, status)).await
    }

    /// Marks the call ringing and stamps `tm_ringing`.
    pub async fn set_status_ringing(&self, id: Uuid) -> Result<()> {
        let repo = self.calls.repository();
        self.calls.update(&id, repo.set_status_ringing(id)).await
    }

    /// Marks the call progressing (answered) and stamps `tm_progressing`.
    pub async fn set_status_progressing(&self, id: Uuid) -> Result<()> {
        let repo = self.calls.repository();
        self.calls.update(&id, repo.set_status_progressing(id)).await
    }

    pub async fn set_hangup(&self, id: Uuid, reason: HangupReason, hangup_by: HangupBy) -> Result<()> {
        let repo = self.calls.repository();
        self.calls
            .update(&id, repo.set_hangup(id, reason, hangup_by))
            .await
    }

    pub async fn set_master_call_id(&self, id: Uuid, master_call_id: Uuid) -> Result<()> {
        let repo = self.calls.repository();
        self.calls
            .update(&id, repo.set_master_call_id(id, master_call_id))
            .await
    }

    pub async fn set_recording_id(&self, id: Uuid, recording_id: Uuid) -> Result<()> {
        let repo = self.calls.repository();
        self.calls
            .update(&id, repo.set_recording_id(id, recording_id))
            .await
    }

    pub async fn add_recording_id(&self, id: Uuid, recording_id: Uuid) -> Result<()> {
        let repo = self.calls.repository();
        self.calls
            .update(&id, repo.add_recording_id(id, recording_id))
            .await
    }

    pub async fn add_chained_call_id(&self, id: Uuid, chained_call_id: Uuid) -> Result<()> {
        let repo = self.calls.repository();
        self.calls
            .update(&id, repo.add_chained_call_id(id, chained_call_id))
            .await
    }

    pub async fn remove_chained_call_id(&self, id: Uuid, chained_call_id: Uuid) -> Result<()> {
        let repo = self.calls.repository();
        self.calls
            .update(&id, repo.remove_chained_call_id(id, chained_call_id))
            .await
    }

    pub async fn set_data(&self, id: Uuid, data: &BTreeMap<String, String>) -> Result<()> {
        let repo = self.calls.repository();
        self.calls.update(&id, repo.set_data(id, data)).await
    }

    /// Runs `body` with call `id` locked.
    ///
    /// `body` gets the current state of the call and a handle for further
    /// writes. Returning `Ok` commits, returning `Err` rolls everything back.
    /// After a commit every call the body touched is refreshed in the cache.
    pub async fn transaction<T, F>(&self, id: Uuid, body: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&CallTransaction<'_>, Call) -> Result<T> + Send + 'static,
    {
        let (value, touched) = self.calls.repository().transaction(id, body).await?;
        tracing::debug!(%id, touched = touched.len(), "Call transaction committed");

        for call_id in touched {
            self.calls.refresh(&call_id).await;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use dbhandler_core::models::{Address, Direction};
    use dbhandler_core::storage::RepositoryError;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::test_support::stepping_database;

    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    async fn handler() -> CallHandler {
        CallHandler::new(
            stepping_database().await,
            Arc::new(MemoryCache::new(100)),
            None,
            POLL_INTERVAL,
        )
    }

    fn outgoing_call(channel_id: &str) -> Call {
        Call::new(Uuid::new_v4(), channel_id, Direction::Outgoing).with_addresses(
            Address::new("tel", "+15550001111"),
            Address::new("tel", "+15550002222"),
        )
    }

    #[tokio::test]
    async fn test_create_then_get_on_cold_cache() {
        let calls = handler().await;
        let call = outgoing_call("1700000000.1");
        calls.create(&call).await.unwrap();

        let fetched = calls.get(call.id).await.unwrap();

        assert_eq!(fetched.id, call.id);
        assert_ne!(fetched.tm_create, call.tm_create);
        assert_eq!(fetched.source, call.source);
    }

    #[tokio::test]
    async fn test_get_by_channel_id() {
        let calls = handler().await;
        let call = outgoing_call("1700000000.2");
        calls.create(&call).await.unwrap();

        let found = calls.get_by_channel_id("1700000000.2").await.unwrap();

        assert_eq!(found.id, call.id);
        assert!(calls.get_by_channel_id("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_transaction_refreshes_every_touched_call() {
        let calls = handler().await;
        let master = outgoing_call("1700000000.3");
        let chained = outgoing_call("1700000000.4");
        calls.create(&master).await.unwrap();
        calls.create(&chained).await.unwrap();
        let chained_id = chained.id;

        calls
            .transaction(master.id, move |tx, current| {
                tx.add_chained_call_id(current.id, chained_id)?;
                tx.set_master_call_id(chained_id, current.id)
            })
            .await
            .unwrap();

        assert_eq!(calls.get(master.id).await.unwrap().chained_call_ids, vec![chained_id]);
        assert_eq!(calls.get(chained_id).await.unwrap().master_call_id, master.id);
    }

    #[tokio::test]
    async fn test_failed_transaction_leaves_cached_call_unchanged() {
        let calls = handler().await;
        let call = outgoing_call("1700000000.5");
        calls.create(&call).await.unwrap();
        let before = calls.get(call.id).await.unwrap();

        let err = calls
            .transaction(call.id, |tx, current| {
                tx.add_chained_call_id(current.id, Uuid::new_v4())?;
                Err::<(), _>(RepositoryError::InvalidFilter("abort".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::InvalidFilter(_)));
        assert_eq!(calls.get(call.id).await.unwrap(), before);
        assert_eq!(calls.calls.reload(&call.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_get_until_timeout_sees_late_create() {
        let calls = handler().await;
        let call = outgoing_call("1700000000.6");
        let writer = calls.clone();
        let late = call.clone();

        let create = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            writer.create(&late).await
        });

        let found = calls
            .get_until_timeout(call.id, Duration::from_secs(2))
            .await
            .unwrap();
        create.await.unwrap().unwrap();

        assert_eq!(found.id, call.id);
    }

    #[tokio::test]
    async fn test_get_until_timeout_expires() {
        let calls = handler().await;

        let err = calls
            .get_until_timeout(Uuid::new_v4(), Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Timeout { entity_type: "Call", .. }));
    }

    #[tokio::test]
    async fn test_hangup_refreshes_cache() {
        let calls = handler().await;
        let call = outgoing_call("1700000000.7");
        calls.create(&call).await.unwrap();

        calls
            .set_hangup(call.id, HangupReason::Normal, HangupBy::Local)
            .await
            .unwrap();

        let cached = calls.get(call.id).await.unwrap();
        assert_eq!(cached.status, CallStatus::Hangup);
        assert_eq!(cached.hangup_by, HangupBy::Local);
    }
}
