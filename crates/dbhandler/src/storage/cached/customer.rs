//! Customers, addressable by id or by email.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use dbhandler_core::cache::Cache;
use dbhandler_core::models::Customer;
use dbhandler_core::storage::{ListQuery, Result};

use super::coordinator::CacheAside;
use crate::storage::sqlite::{Database, SqliteCustomerRepository};

/// Cached access to customers.
#[derive(Clone)]
pub struct CustomerHandler {
    customers: CacheAside<SqliteCustomerRepository>,
}

impl CustomerHandler {
    pub fn new(db: Database, cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self {
            customers: CacheAside::new(Arc::new(SqliteCustomerRepository::new(db)), cache, ttl),
        }
    }

    pub async fn create(&self, customer: &Customer) -> Result<()> {
        self.customers.create(customer).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Customer> {
        self.customers.get(&id).await
    }

    /// Newest customer registered with `email`.
    pub async fn get_by_email(&self, email: &str) -> Result<Customer> {
        let repo = self.customers.repository();
        self.customers
            .get_by("email", email, repo.fetch_by_email(email))
            .await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Customer>> {
        self.customers.list(query).await
    }

    pub async fn set_basic_info(
        &self,
        id: Uuid,
        name: &str,
        detail: &str,
        email: &str,
        phone_number: &str,
        address: &str,
    ) -> Result<()> {
        let repo = self.customers.repository();
        self.customers
            .update(
                &id,
                repo.set_basic_info(id, name, detail, email, phone_number, address),
            )
            .await
    }

    pub async fn set_billing_account_id(&self, id: Uuid, billing_account_id: Uuid) -> Result<()> {
        let repo = self.customers.repository();
        self.customers
            .update(&id, repo.set_billing_account_id(id, billing_account_id))
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.customers.delete(&id).await
    }
}
