use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{DeleteMode, Keyed, Record};
use crate::serde_helpers::null_as_default;
use crate::time::DEFAULT_TIMESTAMP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Basic,
    Ip,
}

/// SIP registration credentials of an extension or trunk.
///
/// Rows are removed outright on delete, so there is no `tm_delete` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipAuth {
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auth_types: Vec<AuthType>,
    pub realm: String,
    pub username: String,
    pub password: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed_ips: Vec<String>,
    pub tm_create: String,
    pub tm_update: String,
}

impl SipAuth {
    pub fn new(
        realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            auth_types: vec![AuthType::Basic],
            realm: realm.into(),
            username: username.into(),
            password: password.into(),
            allowed_ips: Vec::new(),
            tm_create: DEFAULT_TIMESTAMP.to_string(),
            tm_update: DEFAULT_TIMESTAMP.to_string(),
        }
    }

    pub fn with_allowed_ips(mut self, allowed_ips: Vec<String>) -> Self {
        if !self.auth_types.contains(&AuthType::Ip) {
            self.auth_types.push(AuthType::Ip);
        }
        self.allowed_ips = allowed_ips;
        self
    }
}

impl Keyed for SipAuth {
    type Id = Uuid;

    const ENTITY_TYPE: &'static str = "SipAuth";
    const NAMESPACE: &'static str = "sip_auth";

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Record for SipAuth {
    const DELETE_MODE: DeleteMode = DeleteMode::Hard;

    fn tm_create(&self) -> &str {
        &self.tm_create
    }

    fn tm_update(&self) -> &str {
        &self.tm_update
    }

    fn tm_delete(&self) -> &str {
        DEFAULT_TIMESTAMP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sip_auth_is_never_soft_deleted() {
        let auth = SipAuth::new("example.sip.test", "alice", "secret");
        assert!(!auth.is_deleted());
        assert_eq!(SipAuth::DELETE_MODE, DeleteMode::Hard);
    }

    #[test]
    fn test_allowed_ips_enable_ip_auth() {
        let auth = SipAuth::new("example.sip.test", "alice", "secret")
            .with_allowed_ips(vec!["10.0.0.1".to_string()]);
        assert_eq!(auth.auth_types, vec![AuthType::Basic, AuthType::Ip]);
    }
}
