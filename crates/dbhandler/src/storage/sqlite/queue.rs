use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::Value;
use uuid::Uuid;

use dbhandler_core::models::{Queue, RoutingMethod};
use dbhandler_core::storage::{build_list_statement, EntityRepository, ListQuery, Result};
use dbhandler_core::time::DEFAULT_TIMESTAMP;
use dbhandler_core::Keyed;

use super::conversions::{enum_to_sql, json_to_sql, row_to_queue};
use super::database::{text, Database};
use super::error::{map_tokio_rusqlite_error, wrap_err, Operation};
use super::schema;

const WAIT: &str = "wait";
const SERVICE: &str = "service";

/// Milliseconds, saturating at `i64::MAX`.
fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Queues in SQLite, with waiting and in-service queuecalls in a child table.
#[derive(Clone)]
pub struct SqliteQueueRepository {
    db: Database,
}

impl SqliteQueueRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn set_basic_info(&self, id: Uuid, name: &str, detail: &str) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_QUEUE_BASIC_INFO,
                vec![text(name), text(detail), text(self.db.now()), text(id)],
                Queue::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    pub async fn set_routing_method(&self, id: Uuid, routing_method: RoutingMethod) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_QUEUE_ROUTING_METHOD,
                vec![
                    text(enum_to_sql(&routing_method)?),
                    text(self.db.now()),
                    text(id),
                ],
                Queue::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    pub async fn set_tag_ids(&self, id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_QUEUE_TAG_IDS,
                vec![text(json_to_sql(&tag_ids)?), text(self.db.now()), text(id)],
                Queue::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    pub async fn set_wait_actions_and_timeouts(
        &self,
        id: Uuid,
        wait_actions: &[serde_json::Value],
        wait_timeout: i64,
        service_timeout: i64,
    ) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_QUEUE_WAIT_ACTIONS_AND_TIMEOUTS,
                vec![
                    text(json_to_sql(&wait_actions)?),
                    Value::Integer(wait_timeout),
                    Value::Integer(service_timeout),
                    text(self.db.now()),
                    text(id),
                ],
                Queue::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    /// Appends a waiting queuecall and counts it as incoming.
    pub async fn add_wait_queuecall_id(&self, id: Uuid, queuecall_id: Uuid) -> Result<()> {
        self.transact(id, move |tx, id, now| {
            let rows = tx.execute(schema::UPDATE_QUEUE_INCOMING, rusqlite::params![now, id])?;
            if rows == 0 {
                return Err(rusqlite::Error::QueryReturnedNoRows);
            }
            tx.execute(
                schema::INSERT_QUEUE_QUEUECALL,
                rusqlite::params![id, WAIT, queuecall_id.to_string()],
            )?;
            Ok(())
        })
        .await
    }

    /// Moves a queuecall from waiting to in service and adds its wait time.
    pub async fn increase_total_serviced_count(
        &self,
        id: Uuid,
        queuecall_id: Uuid,
        wait_time: Duration,
    ) -> Result<()> {
        let wait_ms = millis(wait_time);
        self.transact(id, move |tx, id, now| {
            let rows = tx.execute(
                schema::UPDATE_QUEUE_SERVICED,
                rusqlite::params![wait_ms, now, id],
            )?;
            if rows == 0 {
                return Err(rusqlite::Error::QueryReturnedNoRows);
            }
            let queuecall_id = queuecall_id.to_string();
            tx.execute(
                schema::DELETE_QUEUE_QUEUECALL,
                rusqlite::params![id, WAIT, queuecall_id],
            )?;
            tx.execute(
                schema::INSERT_QUEUE_QUEUECALL,
                rusqlite::params![id, SERVICE, queuecall_id],
            )?;
            Ok(())
        })
        .await
    }

    /// Drops a waiting queuecall that gave up and adds its wait time.
    pub async fn increase_total_abandoned_count(
        &self,
        id: Uuid,
        queuecall_id: Uuid,
        wait_time: Duration,
    ) -> Result<()> {
        let wait_ms = millis(wait_time);
        self.transact(id, move |tx, id, now| {
            let rows = tx.execute(
                schema::UPDATE_QUEUE_ABANDONED,
                rusqlite::params![wait_ms, now, id],
            )?;
            if rows == 0 {
                return Err(rusqlite::Error::QueryReturnedNoRows);
            }
            tx.execute(
                schema::DELETE_QUEUE_QUEUECALL,
                rusqlite::params![id, WAIT, queuecall_id.to_string()],
            )?;
            Ok(())
        })
        .await
    }

    /// Drops an in-service queuecall and adds its service time.
    pub async fn remove_service_queuecall_id(
        &self,
        id: Uuid,
        queuecall_id: Uuid,
        service_time: Duration,
    ) -> Result<()> {
        let service_ms = millis(service_time);
        self.transact(id, move |tx, id, now| {
            require_queue(tx, id)?;
            let removed = tx.execute(
                schema::DELETE_QUEUE_QUEUECALL,
                rusqlite::params![id, SERVICE, queuecall_id.to_string()],
            )?;
            if removed > 0 {
                tx.execute(
                    schema::UPDATE_QUEUE_SERVICE_DURATION,
                    rusqlite::params![service_ms, now, id],
                )?;
            }
            Ok(())
        })
        .await
    }

    /// Drops a waiting queuecall without touching the counters.
    pub async fn remove_wait_queuecall_id(&self, id: Uuid, queuecall_id: Uuid) -> Result<()> {
        self.transact(id, move |tx, id, now| {
            require_queue(tx, id)?;
            let removed = tx.execute(
                schema::DELETE_QUEUE_QUEUECALL,
                rusqlite::params![id, WAIT, queuecall_id.to_string()],
            )?;
            if removed > 0 {
                tx.execute(schema::UPDATE_QUEUE_TOUCH, rusqlite::params![now, id])?;
            }
            Ok(())
        })
        .await
    }

    /// Runs a multi-statement mutation of one queue atomically.
    async fn transact<F>(&self, id: Uuid, mutation: F) -> Result<()>
    where
        F: FnOnce(&rusqlite::Transaction<'_>, &str, &str) -> rusqlite::Result<()> + Send + 'static,
    {
        let now = self.db.now();
        let id_str = id.to_string();

        self.db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                mutation(&tx, &id_str, &now).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error(e, Queue::ENTITY_TYPE, id.to_string(), Operation::Exec)
            })
    }
}

/// Fails with `QueryReturnedNoRows` when the queue row is missing.
fn require_queue(tx: &rusqlite::Transaction<'_>, id: &str) -> rusqlite::Result<()> {
    tx.query_row(schema::SELECT_QUEUE_EXISTS, rusqlite::params![id], |_| Ok(()))
}

#[async_trait]
impl EntityRepository for SqliteQueueRepository {
    type Record = Queue;

    async fn fetch(&self, id: &Uuid) -> Result<Option<Queue>> {
        self.db
            .query_one(
                schema::SELECT_QUEUE_BY_ID,
                vec![text(id)],
                row_to_queue,
                Queue::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    /// Inserts the queue row and its initial queuecall memberships together.
    async fn insert(&self, queue: &Queue) -> Result<()> {
        let params = vec![
            text(queue.id),
            text(queue.customer_id),
            text(&queue.name),
            text(&queue.detail),
            text(enum_to_sql(&queue.routing_method)?),
            text(json_to_sql(&queue.tag_ids)?),
            text(json_to_sql(&queue.wait_actions)?),
            Value::Integer(queue.wait_timeout),
            Value::Integer(queue.service_timeout),
            Value::Integer(queue.total_incoming_count),
            Value::Integer(queue.total_serviced_count),
            Value::Integer(queue.total_abandoned_count),
            Value::Integer(queue.total_wait_duration),
            Value::Integer(queue.total_service_duration),
            text(self.db.now()),
            text(DEFAULT_TIMESTAMP),
        ];
        let members: Vec<(&'static str, String)> = queue
            .wait_queuecall_ids
            .iter()
            .map(|qc| (WAIT, qc.to_string()))
            .chain(
                queue
                    .service_queuecall_ids
                    .iter()
                    .map(|qc| (SERVICE, qc.to_string())),
            )
            .collect();
        let id_str = queue.id.to_string();

        self.db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(schema::INSERT_QUEUE, rusqlite::params_from_iter(params))
                    .map_err(wrap_err)?;
                for (kind, queuecall_id) in members {
                    tx.execute(
                        schema::INSERT_QUEUE_QUEUECALL,
                        rusqlite::params![id_str, kind, queuecall_id],
                    )
                    .map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error(e, Queue::ENTITY_TYPE, queue.id.to_string(), Operation::Exec)
            })
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.db
            .execute(
                schema::DELETE_QUEUE,
                vec![text(self.db.now()), text(id)],
                Queue::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Queue>> {
        let statement = build_list_statement(
            schema::SELECT_QUEUES,
            schema::QUEUE_FILTERS,
            query,
            &self.db.now(),
        )?;
        self.db
            .query_list(statement, row_to_queue, Queue::ENTITY_TYPE)
            .await
    }
}

#[cfg(test)]
mod tests {
    use dbhandler_core::storage::RepositoryError;

    use super::*;
    use crate::test_support::stepping_database;

    async fn setup() -> (SqliteQueueRepository, Queue) {
        let repo = SqliteQueueRepository::new(stepping_database().await);
        let queue = Queue::new(Uuid::new_v4(), "support");
        repo.insert(&queue).await.unwrap();
        (repo, queue)
    }

    #[tokio::test]
    async fn test_unset_lists_read_back_empty() {
        let (repo, queue) = setup().await;

        let stored = repo.fetch(&queue.id).await.unwrap().unwrap();

        assert!(stored.tag_ids.is_empty());
        assert!(stored.wait_actions.is_empty());
        assert!(stored.wait_queuecall_ids.is_empty());
        assert!(stored.service_queuecall_ids.is_empty());
    }

    #[tokio::test]
    async fn test_insert_keeps_initial_members_in_order() {
        let repo = SqliteQueueRepository::new(stepping_database().await);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut queue = Queue::new(Uuid::new_v4(), "sales");
        queue.wait_queuecall_ids = vec![a, b];
        queue.service_queuecall_ids = vec![c];
        repo.insert(&queue).await.unwrap();

        let stored = repo.fetch(&queue.id).await.unwrap().unwrap();

        assert_eq!(stored.wait_queuecall_ids, vec![a, b]);
        assert_eq!(stored.service_queuecall_ids, vec![c]);
    }

    #[tokio::test]
    async fn test_waiting_members_keep_arrival_order() {
        let (repo, queue) = setup().await;
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for qc in &ids {
            repo.add_wait_queuecall_id(queue.id, *qc).await.unwrap();
        }
        repo.remove_wait_queuecall_id(queue.id, ids[1]).await.unwrap();

        let stored = repo.fetch(&queue.id).await.unwrap().unwrap();

        assert_eq!(stored.wait_queuecall_ids, vec![ids[0], ids[2], ids[3]]);
        assert_eq!(stored.total_incoming_count, 4);
    }

    #[tokio::test]
    async fn test_removing_absent_member_changes_nothing() {
        let (repo, queue) = setup().await;
        repo.add_wait_queuecall_id(queue.id, Uuid::new_v4()).await.unwrap();
        let before = repo.fetch(&queue.id).await.unwrap().unwrap();

        repo.remove_wait_queuecall_id(queue.id, Uuid::new_v4()).await.unwrap();

        let after = repo.fetch(&queue.id).await.unwrap().unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_abandoned_call_leaves_waiting_list() {
        let (repo, queue) = setup().await;
        let qc = Uuid::new_v4();
        repo.add_wait_queuecall_id(queue.id, qc).await.unwrap();

        repo.increase_total_abandoned_count(queue.id, qc, Duration::from_secs(12))
            .await
            .unwrap();

        let stored = repo.fetch(&queue.id).await.unwrap().unwrap();
        assert!(stored.wait_queuecall_ids.is_empty());
        assert!(stored.service_queuecall_ids.is_empty());
        assert_eq!(stored.total_abandoned_count, 1);
        assert_eq!(stored.total_wait_duration, 12_000);
    }

    #[tokio::test]
    async fn test_service_end_adds_service_duration() {
        let (repo, queue) = setup().await;
        let qc = Uuid::new_v4();
        repo.add_wait_queuecall_id(queue.id, qc).await.unwrap();
        repo.increase_total_serviced_count(queue.id, qc, Duration::from_millis(1500))
            .await
            .unwrap();

        repo.remove_service_queuecall_id(queue.id, qc, Duration::from_secs(90))
            .await
            .unwrap();

        let stored = repo.fetch(&queue.id).await.unwrap().unwrap();
        assert!(stored.service_queuecall_ids.is_empty());
        assert_eq!(stored.total_serviced_count, 1);
        assert_eq!(stored.total_wait_duration, 1_500);
        assert_eq!(stored.total_service_duration, 90_000);
    }

    #[tokio::test]
    async fn test_adding_to_missing_queue_is_not_found_and_adds_nothing() {
        let (repo, _) = setup().await;
        let missing = Uuid::new_v4();

        let result = repo.add_wait_queuecall_id(missing, Uuid::new_v4()).await;

        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_removing_from_missing_queue_is_not_found() {
        let (repo, _) = setup().await;
        let missing = Uuid::new_v4();

        let wait = repo.remove_wait_queuecall_id(missing, Uuid::new_v4()).await;
        let service = repo
            .remove_service_queuecall_id(missing, Uuid::new_v4(), Duration::from_secs(1))
            .await;

        assert!(wait.unwrap_err().is_not_found());
        assert!(service.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_filter() {
        let (repo, _) = setup().await;

        let result = repo
            .list(&ListQuery::new(10).with_filter("tag_ids", "[]"))
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::InvalidFilter("tag_ids".to_string()))
        );
    }
}
