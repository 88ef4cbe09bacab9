use async_trait::async_trait;
use rusqlite::types::Value;
use uuid::Uuid;

use dbhandler_core::models::Account;
use dbhandler_core::storage::{
    build_list_statement, EntityRepository, ListQuery, RepositoryError, Result,
};
use dbhandler_core::time::DEFAULT_TIMESTAMP;
use dbhandler_core::Keyed;

use super::conversions::row_to_account;
use super::database::{text, Database};
use super::error::{map_tokio_rusqlite_error, wrap_err, Operation};
use super::schema;

/// Billing accounts in SQLite.
#[derive(Clone)]
pub struct SqliteAccountRepository {
    db: Database,
}

impl SqliteAccountRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn set_basic_info(&self, id: Uuid, name: &str, detail: &str) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_ACCOUNT_BASIC_INFO,
                vec![text(name), text(detail), text(self.db.now()), text(id)],
                Account::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    pub async fn add_balance(&self, id: Uuid, amount: f64) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_ACCOUNT_ADD_BALANCE,
                vec![Value::Real(amount), text(self.db.now()), text(id)],
                Account::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    pub async fn subtract_balance(&self, id: Uuid, amount: f64) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_ACCOUNT_SUBTRACT_BALANCE,
                vec![Value::Real(amount), text(self.db.now()), text(id)],
                Account::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    /// Subtracts `amount` only if the balance covers it, in one statement.
    ///
    /// Fails with `InsufficientBalance` (row untouched) or `NotFound`.
    pub async fn subtract_balance_with_check(&self, id: Uuid, amount: f64) -> Result<()> {
        let now = self.db.now();
        let id_str = id.to_string();

        let updated = self
            .db
            .connection()
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_ACCOUNT_SUBTRACT_BALANCE_CHECKED,
                        rusqlite::params![amount, now, id_str],
                    )
                    .map_err(wrap_err)?;
                if rows > 0 {
                    return Ok(true);
                }

                match conn.query_row(schema::EXISTS_ACCOUNT, [&id_str], |_| Ok(())) {
                    Ok(()) => Ok(false),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error(e, Account::ENTITY_TYPE, id.to_string(), Operation::Exec)
            })?;

        if updated {
            Ok(())
        } else {
            Err(RepositoryError::InsufficientBalance { id: id.to_string() })
        }
    }
}

#[async_trait]
impl EntityRepository for SqliteAccountRepository {
    type Record = Account;

    async fn fetch(&self, id: &Uuid) -> Result<Option<Account>> {
        self.db
            .query_one(
                schema::SELECT_ACCOUNT_BY_ID,
                vec![text(id)],
                row_to_account,
                Account::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn insert(&self, account: &Account) -> Result<()> {
        self.db
            .execute(
                schema::INSERT_ACCOUNT,
                vec![
                    text(account.id),
                    text(account.customer_id),
                    text(&account.name),
                    text(&account.detail),
                    Value::Real(account.balance),
                    text(self.db.now()),
                    text(DEFAULT_TIMESTAMP),
                ],
                Account::ENTITY_TYPE,
                account.id.to_string(),
            )
            .await
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.db
            .execute(
                schema::DELETE_ACCOUNT,
                vec![text(self.db.now()), text(id)],
                Account::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Account>> {
        let statement = build_list_statement(
            schema::SELECT_ACCOUNTS,
            schema::ACCOUNT_FILTERS,
            query,
            &self.db.now(),
        )?;
        self.db
            .query_list(statement, row_to_account, Account::ENTITY_TYPE)
            .await
    }
}
