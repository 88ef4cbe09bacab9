use async_trait::async_trait;
use uuid::Uuid;

use dbhandler_core::models::Customer;
use dbhandler_core::storage::{build_list_statement, EntityRepository, ListQuery, Result};
use dbhandler_core::time::DEFAULT_TIMESTAMP;
use dbhandler_core::Keyed;

use super::conversions::row_to_customer;
use super::database::{text, Database};
use super::schema;

/// Customers in SQLite.
#[derive(Clone)]
pub struct SqliteCustomerRepository {
    db: Database,
}

impl SqliteCustomerRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Newest customer registered with `email`, deleted or not.
    pub async fn fetch_by_email(&self, email: &str) -> Result<Option<Customer>> {
        self.db
            .query_one(
                schema::SELECT_CUSTOMER_BY_EMAIL,
                vec![text(email)],
                row_to_customer,
                Customer::ENTITY_TYPE,
                email.to_string(),
            )
            .await
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
        self.db
            .execute(
                schema::UPDATE_CUSTOMER_BASIC_INFO,
                vec![
                    text(name),
                    text(detail),
                    text(email),
                    text(phone_number),
                    text(address),
                    text(self.db.now()),
                    text(id),
                ],
                Customer::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    pub async fn set_billing_account_id(&self, id: Uuid, billing_account_id: Uuid) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_CUSTOMER_BILLING_ACCOUNT_ID,
                vec![text(billing_account_id), text(self.db.now()), text(id)],
                Customer::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }
}

#[async_trait]
impl EntityRepository for SqliteCustomerRepository {
    type Record = Customer;

    async fn fetch(&self, id: &Uuid) -> Result<Option<Customer>> {
        self.db
            .query_one(
                schema::SELECT_CUSTOMER_BY_ID,
                vec![text(id)],
                row_to_customer,
                Customer::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn insert(&self, customer: &Customer) -> Result<()> {
        self.db
            .execute(
                schema::INSERT_CUSTOMER,
                vec![
                    text(customer.id),
                    text(&customer.name),
                    text(&customer.detail),
                    text(&customer.email),
                    text(&customer.phone_number),
                    text(&customer.address),
                    text(customer.billing_account_id),
                    text(self.db.now()),
                    text(DEFAULT_TIMESTAMP),
                ],
                Customer::ENTITY_TYPE,
                customer.id.to_string(),
            )
            .await
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.db
            .execute(
                schema::DELETE_CUSTOMER,
                vec![text(self.db.now()), text(id)],
                Customer::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Customer>> {
        let statement = build_list_statement(
            schema::SELECT_CUSTOMERS,
            schema::CUSTOMER_FILTERS,
            query,
            &self.db.now(),
        )?;
        self.db
            .query_list(statement, row_to_customer, Customer::ENTITY_TYPE)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::stepping_database;

    #[tokio::test]
    async fn test_fetch_by_email_prefers_newest() {
        let repo = SqliteCustomerRepository::new(stepping_database().await);
        let older = Customer::new("old", "shared@example.test");
        let newer = Customer::new("new", "shared@example.test");
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();

        let found = repo.fetch_by_email("shared@example.test").await.unwrap().unwrap();

        assert_eq!(found.id, newer.id);
    }

    #[tokio::test]
    async fn test_fetch_by_unknown_email_is_none() {
        let repo = SqliteCustomerRepository::new(stepping_database().await);
        assert!(repo.fetch_by_email("nobody@example.test").await.unwrap().is_none());
    }
}
