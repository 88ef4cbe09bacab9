//! Billing accounts.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use dbhandler_core::cache::Cache;
use dbhandler_core::models::Account;
use dbhandler_core::storage::{ListQuery, Result};

use super::coordinator::CacheAside;
use crate::storage::sqlite::{Database, SqliteAccountRepository};

/// Cached access to accounts.
#[derive(Clone)]
pub struct AccountHandler {
    accounts: CacheAside<SqliteAccountRepository>,
}

impl AccountHandler {
    pub fn new(db: Database, cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self {
            accounts: CacheAside::new(Arc::new(SqliteAccountRepository::new(db)), cache, ttl),
        }
    }

    pub async fn create(&self, account: &Account) -> Result<()> {
        self.accounts.create(account).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Account> {
        self.accounts.get(&id).await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Account>> {
        self.accounts.list(query).await
    }

    pub async fn set_basic_info(&self, id: Uuid, name: &str, detail: &str) -> Result<()> {
        let repo = self.accounts.repository();
        self.accounts
            .update(&id, repo.set_basic_info(id, name, detail))
            .await
    }

    pub async fn add_balance(&self, id: Uuid, amount: f64) -> Result<()> {
        let repo = self.accounts.repository();
        self.accounts.update(&id, repo.add_balance(id, amount)).await
    }

    /// Subtracts `amount` even if the balance goes negative.
    pub async fn subtract_balance(&self, id: Uuid, amount: f64) -> Result<()> {
        let repo = self.accounts.repository();
        self.accounts
            .update(&id, repo.subtract_balance(id, amount))
            .await
    }

    /// Subtracts `amount` only if the balance covers it.
    ///
    /// Fails with `InsufficientBalance` and leaves the account untouched
    /// otherwise.
    pub async fn subtract_balance_with_check(&self, id: Uuid, amount: f64) -> Result<()> {
        let repo = self.accounts.repository();
        self.accounts
            .update(&id, repo.subtract_balance_with_check(id, amount))
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.accounts.delete(&id).await
    }
}
