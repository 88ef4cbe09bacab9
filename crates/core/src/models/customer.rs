use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::secondary_key;
use crate::record::{Keyed, Record};
use crate::time::DEFAULT_TIMESTAMP;

/// A tenant of the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub detail: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    /// Account charged for this customer's usage. Nil until assigned.
    pub billing_account_id: Uuid,
    pub tm_create: String,
    pub tm_update: String,
    pub tm_delete: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            detail: String::new(),
            email: email.into(),
            phone_number: String::new(),
            address: String::new(),
            billing_account_id: Uuid::nil(),
            tm_create: DEFAULT_TIMESTAMP.to_string(),
            tm_update: DEFAULT_TIMESTAMP.to_string(),
            tm_delete: DEFAULT_TIMESTAMP.to_string(),
        }
    }

    /// Cache key of the email lookup slot.
    pub fn email_key(email: &str) -> String {
        secondary_key(Self::NAMESPACE, "email", email)
    }
}

impl Keyed for Customer {
    type Id = Uuid;

    const ENTITY_TYPE: &'static str = "Customer";
    const NAMESPACE: &'static str = "customer";

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Record for Customer {
    lifecycle_timestamps!();

    fn secondary_keys(&self) -> Vec<String> {
        if self.email.is_empty() {
            return Vec::new();
        }
        vec![Self::email_key(&self.email)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secondary_keys_follow_email() {
        let customer = Customer::new("acme", "ops@acme.test");
        assert_eq!(customer.secondary_keys(), vec!["customer:email:ops@acme.test"]);
    }

    #[test]
    fn test_no_secondary_key_without_email() {
        let customer = Customer::new("acme", "");
        assert!(customer.secondary_keys().is_empty());
    }
}
