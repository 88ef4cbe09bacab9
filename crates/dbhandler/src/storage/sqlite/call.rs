use std::cell::RefCell;
use std::collections::BTreeMap;

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::TransactionBehavior;
use uuid::Uuid;

use dbhandler_core::models::{Call, CallStatus, HangupBy, HangupReason};
use dbhandler_core::storage::{
    build_list_statement, EntityRepository, ListQuery, RepositoryError, Result,
};
use dbhandler_core::time::DEFAULT_TIMESTAMP;
use dbhandler_core::Keyed;

use super::conversions::{enum_to_sql, json_to_sql, row_to_call};
use super::database::{text, Database};
use super::error::{map_tokio_rusqlite_error, wrap_err, Operation};
use super::schema;

fn exec_error(err: rusqlite::Error, id: Uuid) -> RepositoryError {
    map_tokio_rusqlite_error(wrap_err(err), Call::ENTITY_TYPE, id.to_string(), Operation::Exec)
}

/// Write access to calls inside a locked call transaction.
///
/// Only lives for the duration of the closure passed to
/// [`SqliteCallRepository::transaction`]; every statement joins that
/// transaction.
pub struct CallTransaction<'a> {
    tx: &'a rusqlite::Transaction<'a>,
    now: &'a str,
    touched: RefCell<Vec<Uuid>>,
}

impl CallTransaction<'_> {
    pub fn add_chained_call_id(&self, id: Uuid, chained_call_id: Uuid) -> Result<()> {
        self.touch(id)?;
        self.tx
            .execute(
                schema::INSERT_CALL_CHAINED_CALL,
                rusqlite::params![id.to_string(), chained_call_id.to_string()],
            )
            .map_err(|e| exec_error(e, id))?;
        Ok(())
    }

    pub fn remove_chained_call_id(&self, id: Uuid, chained_call_id: Uuid) -> Result<()> {
        self.touch(id)?;
        self.tx
            .execute(
                schema::DELETE_CALL_CHAINED_CALL,
                rusqlite::params![id.to_string(), chained_call_id.to_string()],
            )
            .map_err(|e| exec_error(e, id))?;
        Ok(())
    }

    pub fn set_master_call_id(&self, id: Uuid, master_call_id: Uuid) -> Result<()> {
        let rows = self
            .tx
            .execute(
                schema::UPDATE_CALL_MASTER_CALL_ID,
                rusqlite::params![master_call_id.to_string(), self.now, id.to_string()],
            )
            .map_err(|e| exec_error(e, id))?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity_type: Call::ENTITY_TYPE,
                id: id.to_string(),
            });
        }
        self.record(id);
        Ok(())
    }

    /// Bumps `tm_update`; a missing call is `NotFound`.
    fn touch(&self, id: Uuid) -> Result<()> {
        let rows = self
            .tx
            .execute(schema::UPDATE_CALL_TOUCH, rusqlite::params![self.now, id.to_string()])
            .map_err(|e| exec_error(e, id))?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity_type: Call::ENTITY_TYPE,
                id: id.to_string(),
            });
        }
        self.record(id);
        Ok(())
    }

    fn record(&self, id: Uuid) {
        let mut touched = self.touched.borrow_mut();
        if !touched.contains(&id) {
            touched.push(id);
        }
    }
}

/// Calls in SQLite, with chained calls and recordings in child tables.
#[derive(Clone)]
pub struct SqliteCallRepository {
    db: Database,
}

impl SqliteCallRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Newest call attached to `channel_id`.
    pub async fn fetch_by_channel_id(&self, channel_id: &str) -> Result<Option<Call>> {
        self.db
            .query_one(
                schema::SELECT_CALL_BY_CHANNEL_ID,
                vec![text(channel_id)],
                row_to_call,
                Call::ENTITY_TYPE,
                channel_id.to_string(),
            )
            .await
    }

    pub async fn set_bridge_id(&self, id: Uuid, bridge_id: &str) -> Result<()> {
        self.update(schema::UPDATE_CALL_BRIDGE_ID, id, vec![text(bridge_id)])
            .await
    }

    /// Sets the status without stamping the status timestamps.
    pub async fn set_status(&self, id: Uuid, status: CallStatus) -> Result<()> {
        self.update(schema::UPDATE_CALL_STATUS, id, vec![text(enum_to_sql(&status)?)])
            .await
    }

    pub async fn set_status_ringing(&self, id: Uuid) -> Result<()> {
        self.update(schema::UPDATE_CALL_STATUS_RINGING, id, Vec::new())
            .await
    }

    pub async fn set_status_progressing(&self, id: Uuid) -> Result<()> {
        self.update(schema::UPDATE_CALL_STATUS_PROGRESSING, id, Vec::new())
            .await
    }

    pub async fn set_hangup(
        &self,
        id: Uuid,
        reason: HangupReason,
        hangup_by: HangupBy,
    ) -> Result<()> {
        self.update(
            schema::UPDATE_CALL_HANGUP,
            id,
            vec![text(enum_to_sql(&hangup_by)?), text(enum_to_sql(&reason)?)],
        )
        .await
    }

    pub async fn set_master_call_id(&self, id: Uuid, master_call_id: Uuid) -> Result<()> {
        self.update(schema::UPDATE_CALL_MASTER_CALL_ID, id, vec![text(master_call_id)])
            .await
    }

    pub async fn set_recording_id(&self, id: Uuid, recording_id: Uuid) -> Result<()> {
        self.update(schema::UPDATE_CALL_RECORDING_ID, id, vec![text(recording_id)])
            .await
    }

    pub async fn set_data(&self, id: Uuid, data: &BTreeMap<String, String>) -> Result<()> {
        self.update(schema::UPDATE_CALL_DATA, id, vec![text(json_to_sql(data)?)])
            .await
    }

    pub async fn add_recording_id(&self, id: Uuid, recording_id: Uuid) -> Result<()> {
        self.mutate_member(id, schema::INSERT_CALL_RECORDING, recording_id)
            .await
    }

    pub async fn add_chained_call_id(&self, id: Uuid, chained_call_id: Uuid) -> Result<()> {
        self.mutate_member(id, schema::INSERT_CALL_CHAINED_CALL, chained_call_id)
            .await
    }

    pub async fn remove_chained_call_id(&self, id: Uuid, chained_call_id: Uuid) -> Result<()> {
        self.mutate_member(id, schema::DELETE_CALL_CHAINED_CALL, chained_call_id)
            .await
    }

    /// Locks `id`, hands its current state to `body` and commits if `body`
    /// succeeds. Any error rolls back every statement `body` issued.
    ///
    /// Returns `body`'s value and the ids of every call it modified.
    pub async fn transaction<T, F>(&self, id: Uuid, body: F) -> Result<(T, Vec<Uuid>)>
    where
        T: Send + 'static,
        F: FnOnce(&CallTransaction<'_>, Call) -> Result<T> + Send + 'static,
    {
        let now = self.db.now();
        let id_str = id.to_string();

        self.db
            .connection()
            .call(move |conn| {
                // IMMEDIATE takes the write lock up front, so the read below
                // cannot go stale before commit.
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let current = match tx.query_row(schema::SELECT_CALL_BY_ID, [&id_str], row_to_call)
                {
                    Ok(call) => call,
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        return Ok(Err(RepositoryError::NotFound {
                            entity_type: Call::ENTITY_TYPE,
                            id: id_str,
                        }));
                    }
                    Err(e) => return Err(wrap_err(e)),
                };

                let (result, touched) = {
                    let handle = CallTransaction {
                        tx: &tx,
                        now: &now,
                        touched: RefCell::new(Vec::new()),
                    };
                    let result = body(&handle, current);
                    (result, handle.touched.into_inner())
                };

                match result {
                    Ok(value) => {
                        tx.commit().map_err(wrap_err)?;
                        Ok(Ok((value, touched)))
                    }
                    Err(err) => {
                        tx.rollback().map_err(wrap_err)?;
                        Ok(Err(err))
                    }
                }
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error(e, Call::ENTITY_TYPE, id.to_string(), Operation::Exec)
            })?
    }

    async fn update(&self, sql: &'static str, id: Uuid, mut params: Vec<Value>) -> Result<()> {
        params.push(text(self.db.now()));
        params.push(text(id));
        self.db
            .execute(sql, params, Call::ENTITY_TYPE, id.to_string())
            .await
    }

    /// Runs a child-table statement `(call_id, member_id)` and bumps the call's
    /// `tm_update`, atomically.
    async fn mutate_member(&self, id: Uuid, sql: &'static str, member_id: Uuid) -> Result<()> {
        let now = self.db.now();
        let id_str = id.to_string();

        self.db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let rows = tx
                    .execute(schema::UPDATE_CALL_TOUCH, rusqlite::params![now, id_str])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    return Err(wrap_err(rusqlite::Error::QueryReturnedNoRows));
                }
                tx.execute(sql, rusqlite::params![id_str, member_id.to_string()])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error(e, Call::ENTITY_TYPE, id.to_string(), Operation::Exec)
            })
    }
}

#[async_trait]
impl EntityRepository for SqliteCallRepository {
    type Record = Call;

    async fn fetch(&self, id: &Uuid) -> Result<Option<Call>> {
        self.db
            .query_one(
                schema::SELECT_CALL_BY_ID,
                vec![text(id)],
                row_to_call,
                Call::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn insert(&self, call: &Call) -> Result<()> {
        let params = vec![
            text(call.id),
            text(call.customer_id),
            text(&call.channel_id),
            text(&call.bridge_id),
            text(call.flow_id),
            text(enum_to_sql(&call.call_type)?),
            text(enum_to_sql(&call.status)?),
            text(enum_to_sql(&call.direction)?),
            text(json_to_sql(&call.source)?),
            text(json_to_sql(&call.destination)?),
            text(json_to_sql(&call.data)?),
            text(call.master_call_id),
            text(call.recording_id),
            text(enum_to_sql(&call.hangup_by)?),
            text(enum_to_sql(&call.hangup_reason)?),
            text(DEFAULT_TIMESTAMP),
            text(self.db.now()),
        ];
        let id_str = call.id.to_string();
        let chained: Vec<String> = call.chained_call_ids.iter().map(Uuid::to_string).collect();
        let recordings: Vec<String> = call.recording_ids.iter().map(Uuid::to_string).collect();

        self.db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(schema::INSERT_CALL, rusqlite::params_from_iter(params))
                    .map_err(wrap_err)?;
                for chained_call_id in &chained {
                    tx.execute(
                        schema::INSERT_CALL_CHAINED_CALL,
                        rusqlite::params![id_str, chained_call_id],
                    )
                    .map_err(wrap_err)?;
                }
                for recording_id in &recordings {
                    tx.execute(
                        schema::INSERT_CALL_RECORDING,
                        rusqlite::params![id_str, recording_id],
                    )
                    .map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error(e, Call::ENTITY_TYPE, call.id.to_string(), Operation::Exec)
            })
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.db
            .execute(
                schema::DELETE_CALL,
                vec![text(self.db.now()), text(id)],
                Call::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Call>> {
        let statement = build_list_statement(
            schema::SELECT_CALLS,
            schema::CALL_FILTERS,
            query,
            &self.db.now(),
        )?;
        self.db
            .query_list(statement, row_to_call, Call::ENTITY_TYPE)
            .await
    }
}
