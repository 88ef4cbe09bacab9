//! SIP credentials. Deleted rows are gone for good.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use dbhandler_core::cache::Cache;
use dbhandler_core::models::SipAuth;
use dbhandler_core::storage::{ListQuery, Result};

use super::coordinator::CacheAside;
use crate::storage::sqlite::{Database, SqliteSipAuthRepository};

/// Cached access to SIP credentials.
#[derive(Clone)]
pub struct SipAuthHandler {
    auths: CacheAside<SqliteSipAuthRepository>,
}

impl SipAuthHandler {
    pub fn new(db: Database, cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self {
            auths: CacheAside::new(Arc::new(SqliteSipAuthRepository::new(db)), cache, ttl),
        }
    }

    pub async fn create(&self, auth: &SipAuth) -> Result<()> {
        self.auths.create(auth).await
    }

    pub async fn get(&self, id: Uuid) -> Result<SipAuth> {
        self.auths.get(&id).await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<SipAuth>> {
        self.auths.list(query).await
    }

    /// Replaces the credentials of `auth.id` with the fields of `auth`.
    pub async fn update(&self, auth: &SipAuth) -> Result<()> {
        let repo = self.auths.repository();
        self.auths.update(&auth.id, repo.update(auth)).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.auths.delete(&id).await
    }
}
