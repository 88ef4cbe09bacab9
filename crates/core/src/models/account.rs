use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{Keyed, Record};
use crate::time::DEFAULT_TIMESTAMP;

/// A billing account owned by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub name: String,
    pub detail: String,
    /// Prepaid balance in USD.
    pub balance: f64,
    pub tm_create: String,
    pub tm_update: String,
    pub tm_delete: String,
}

impl Account {
    /// Creates an unsaved account with a zero balance.
    pub fn new(customer_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            name: name.into(),
            detail: String::new(),
            balance: 0.0,
            tm_create: DEFAULT_TIMESTAMP.to_string(),
            tm_update: DEFAULT_TIMESTAMP.to_string(),
            tm_delete: DEFAULT_TIMESTAMP.to_string(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_balance(mut self, balance: f64) -> Self {
        self.balance = balance;
        self
    }
}

impl Keyed for Account {
    type Id = Uuid;

    const ENTITY_TYPE: &'static str = "Account";
    const NAMESPACE: &'static str = "account";

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Record for Account {
    lifecycle_timestamps!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_is_live_and_empty() {
        let account = Account::new(Uuid::new_v4(), "main");

        assert_eq!(account.balance, 0.0);
        assert_eq!(account.tm_update, DEFAULT_TIMESTAMP);
        assert!(!account.is_deleted());
    }

    #[test]
    fn test_soft_deleted_account() {
        let mut account = Account::new(Uuid::new_v4(), "main");
        account.tm_delete = "2024-01-01 00:00:00.000000".to_string();

        assert!(account.is_deleted());
    }
}
