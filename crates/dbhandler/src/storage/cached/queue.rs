//! Call queues and their waiting / in-service members.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use dbhandler_core::cache::Cache;
use dbhandler_core::models::{Queue, RoutingMethod};
use dbhandler_core::storage::{ListQuery, Result};

use super::coordinator::CacheAside;
use crate::storage::sqlite::{Database, SqliteQueueRepository};

/// Cached access to queues.
///
/// Member list changes run as single SQL transactions, so concurrent
/// callers never lose each other's updates.
#[derive(Clone)]
pub struct QueueHandler {
    queues: CacheAside<SqliteQueueRepository>,
}

impl QueueHandler {
    pub fn new(db: Database, cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self {
            queues: CacheAside::new(Arc::new(SqliteQueueRepository::new(db)), cache, ttl),
        }
    }

    pub async fn create(&self, queue: &Queue) -> Result<()> {
        self.queues.create(queue).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Queue> {
        self.queues.get(&id).await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Queue>> {
        self.queues.list(query).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.queues.delete(&id).await
    }

    pub async fn set_basic_info(&self, id: Uuid, name: &str, detail: &str) -> Result<()> {
        let repo = self.queues.repository();
        self.queues
            .update(&id, repo.set_basic_info(id, name, detail))
            .await
    }

    pub async fn set_routing_method(&self, id: Uuid, routing_method: RoutingMethod) -> Result<()> {
        let repo = self.queues.repository();
        self.queues
            .update(&id, repo.set_routing_method(id, routing_method))
            .await
    }

    pub async fn set_tag_ids(&self, id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let repo = self.queues.repository();
        self.queues.update(&id, repo.set_tag_ids(id, tag_ids)).await
    }

    pub async fn set_wait_actions_and_timeouts(
        &self,
        id: Uuid,
        wait_actions: &[serde_json::Value],
        wait_timeout: i64,
        service_timeout: i64,
    ) -> Result<()> {
        let repo = self.queues.repository();
        self.queues
            .update(
                &id,
                repo.set_wait_actions_and_timeouts(id, wait_actions, wait_timeout, service_timeout),
            )
            .await
    }

    /// Adds a queuecall to the waiting list and counts it as incoming.
    pub async fn add_wait_queuecall_id(&self, id: Uuid, queuecall_id: Uuid) -> Result<()> {
        let repo = self.queues.repository();
        self.queues
            .update(&id, repo.add_wait_queuecall_id(id, queuecall_id))
            .await
    }

    /// Moves a queuecall from waiting to in service.
    pub async fn increase_total_serviced_count(
        &self,
        id: Uuid,
        queuecall_id: Uuid,
        wait_time: Duration,
    ) -> Result<()> {
        let repo = self.queues.repository();
        self.queues
            .update(
                &id,
                repo.increase_total_serviced_count(id, queuecall_id, wait_time),
            )
            .await
    }

    /// Drops a waiting queuecall that hung up before being served.
    pub async fn increase_total_abandoned_count(
        &self,
        id: Uuid,
        queuecall_id: Uuid,
        wait_time: Duration,
    ) -> Result<()> {
        let repo = self.queues.repository();
        self.queues
            .update(
                &id,
                repo.increase_total_abandoned_count(id, queuecall_id, wait_time),
            )
            .await
    }

    pub async fn remove_service_queuecall_id(
        &self,
        id: Uuid,
        queuecall_id: Uuid,
        service_time: Duration,
    ) -> Result<()> {
        let repo = self.queues.repository();
        self.queues
            .update(
                &id,
                repo.remove_service_queuecall_id(id, queuecall_id, service_time),
            )
            .await
    }

    pub async fn remove_wait_queuecall_id(&self, id: Uuid, queuecall_id: Uuid) -> Result<()> {
        let repo = self.queues.repository();
        self.queues
            .update(&id, repo.remove_wait_queuecall_id(id, queuecall_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use dbhandler_core::cache::record_key;
    use dbhandler_core::storage::RepositoryError;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::test_support::stepping_database;

    async fn setup() -> (QueueHandler, Queue) {
        let queues = QueueHandler::new(
            stepping_database().await,
            Arc::new(MemoryCache::new(100)),
            None,
        );
        let queue = Queue::new(Uuid::new_v4(), "support");
        queues.create(&queue).await.unwrap();
        (queues, queue)
    }

    #[tokio::test]
    async fn test_waiting_call_served() {
        let (queues, queue) = setup().await;
        let c1 = Uuid::new_v4();

        queues.add_wait_queuecall_id(queue.id, c1).await.unwrap();
        queues
            .increase_total_serviced_count(queue.id, c1, Duration::from_secs(5))
            .await
            .unwrap();

        let served = queues.get(queue.id).await.unwrap();
        assert_eq!(served.total_incoming_count, 1);
        assert_eq!(served.total_serviced_count, 1);
        assert!(!served.wait_queuecall_ids.contains(&c1));
        assert_eq!(served.service_queuecall_ids, vec![c1]);
        assert!(served.total_wait_duration >= 5000);
    }

    #[tokio::test]
    async fn test_service_end_clears_member() {
        let (queues, queue) = setup().await;
        let c1 = Uuid::new_v4();
        queues.add_wait_queuecall_id(queue.id, c1).await.unwrap();
        queues
            .increase_total_serviced_count(queue.id, c1, Duration::from_millis(1500))
            .await
            .unwrap();

        queues
            .remove_service_queuecall_id(queue.id, c1, Duration::from_secs(30))
            .await
            .unwrap();

        let done = queues.get(queue.id).await.unwrap();
        assert!(done.service_queuecall_ids.is_empty());
        assert_eq!(done.total_serviced_count, 1);
        assert_eq!(done.total_service_duration, 30_000);
    }

    #[tokio::test]
    async fn test_concurrent_joins_are_all_kept() {
        let (queues, queue) = setup().await;
        let members: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();

        let joins = members.iter().map(|qc| {
            let queues = queues.clone();
            let (id, qc) = (queue.id, *qc);
            tokio::spawn(async move { queues.add_wait_queuecall_id(id, qc).await })
        });
        for join in joins.collect::<Vec<_>>() {
            join.await.unwrap().unwrap();
        }

        let joined = queues.get(queue.id).await.unwrap();
        assert_eq!(joined.total_incoming_count, 8);
        assert_eq!(joined.wait_queuecall_ids.len(), 8);
        assert!(members.iter().all(|m| joined.wait_queuecall_ids.contains(m)));
    }

    #[tokio::test]
    async fn test_routing_method_is_refreshed() {
        let (queues, queue) = setup().await;

        queues
            .set_routing_method(queue.id, RoutingMethod::Random)
            .await
            .unwrap();

        assert_eq!(
            queues.get(queue.id).await.unwrap().routing_method,
            RoutingMethod::Random
        );
    }

    #[tokio::test]
    async fn test_undecodable_row_surfaces_scan_error_and_is_not_cached() {
        let db = stepping_database().await;
        let cache = Arc::new(MemoryCache::new(100));
        let queues = QueueHandler::new(db.clone(), cache.clone(), None);
        let queue = Queue::new(Uuid::new_v4(), "support");
        queues.create(&queue).await.unwrap();

        let id = queue.id.to_string();
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE queues SET tag_ids = 'not json' WHERE id = ?1",
                    [id],
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .unwrap();

        // The write lands; the re-read that follows cannot decode the row.
        queues
            .set_basic_info(queue.id, "support", "broken")
            .await
            .unwrap();

        let err = queues.get(queue.id).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Scan(_)));
        assert!(cache
            .get(&record_key::<Queue>(&queue.id))
            .await
            .unwrap()
            .is_none());
    }
}
