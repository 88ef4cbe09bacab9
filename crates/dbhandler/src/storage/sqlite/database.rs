//! Shared SQLite handle.

use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::Row;
use tokio_rusqlite::Connection;

use dbhandler_core::storage::{ListStatement, RepositoryError, Result};
use dbhandler_core::time::{format_timestamp, Clock, SystemClock};

use super::error::{map_tokio_rusqlite_error, wrap_err, Operation};
use super::schema;

/// Row mapper used by the query helpers.
pub type RowMapper<T> = fn(&Row) -> rusqlite::Result<T>;

/// Binds any displayable value as a TEXT parameter.
pub fn text(value: impl ToString) -> Value {
    Value::Text(value.to_string())
}

/// Async SQLite connection plus the clock used for lifecycle timestamps.
///
/// Cheap to clone; clones share the underlying connection thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    clock: Arc<dyn Clock>,
}

impl Database {
    /// Opens (or creates) a file-based database and creates missing tables.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init(conn).await
    }

    /// Creates an in-memory database.
    ///
    /// Useful for testing - data is lost when the last clone is dropped.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        let database = Self {
            conn,
            clock: Arc::new(SystemClock),
        };
        database.migrate().await?;
        Ok(database)
    }

    /// Replaces the clock used for `tm_create`, `tm_update` and `tm_delete`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates missing tables and indexes.
    pub async fn migrate(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Schema", "", Operation::Exec))
    }

    /// Current time in the persisted timestamp layout.
    pub fn now(&self) -> String {
        format_timestamp(&self.clock.now())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs a single-row query. No rows is `Ok(None)`.
    pub(crate) async fn query_one<T: Send + 'static>(
        &self,
        sql: &'static str,
        params: Vec<Value>,
        mapper: RowMapper<T>,
        entity_type: &'static str,
        id: String,
    ) -> Result<Option<T>> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(sql).map_err(wrap_err)?;
                match stmt.query_row(rusqlite::params_from_iter(params), mapper) {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, entity_type, id, Operation::Query))
    }

    /// Runs a list statement built by `build_list_statement`.
    pub(crate) async fn query_list<T: Send + 'static>(
        &self,
        statement: ListStatement,
        mapper: RowMapper<T>,
        entity_type: &'static str,
    ) -> Result<Vec<T>> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&statement.sql).map_err(wrap_err)?;
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(statement.params), mapper)
                    .map_err(wrap_err)?;

                let mut records = Vec::new();
                for row_result in rows {
                    records.push(row_result.map_err(wrap_err)?);
                }
                Ok(records)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, entity_type, "", Operation::Query))
    }

    /// Runs one write statement. Touching no row is `NotFound`.
    pub(crate) async fn execute(
        &self,
        sql: &'static str,
        params: Vec<Value>,
        entity_type: &'static str,
        id: String,
    ) -> Result<()> {
        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(sql, rusqlite::params_from_iter(params))
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, entity_type, id, Operation::Exec))
    }
}
