use async_trait::async_trait;
use uuid::Uuid;

use dbhandler_core::models::SipAuth;
use dbhandler_core::storage::{build_list_statement, EntityRepository, ListQuery, Result};
use dbhandler_core::time::DEFAULT_TIMESTAMP;
use dbhandler_core::Keyed;

use super::conversions::{json_to_sql, row_to_sip_auth};
use super::database::{text, Database};
use super::schema;

/// SIP credentials in SQLite. Deletes remove the row.
#[derive(Clone)]
pub struct SqliteSipAuthRepository {
    db: Database,
}

impl SqliteSipAuthRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Overwrites every mutable column from `auth`.
    pub async fn update(&self, auth: &SipAuth) -> Result<()> {
        self.db
            .execute(
                schema::UPDATE_SIP_AUTH,
                vec![
                    text(json_to_sql(&auth.auth_types)?),
                    text(&auth.realm),
                    text(&auth.username),
                    text(&auth.password),
                    text(json_to_sql(&auth.allowed_ips)?),
                    text(self.db.now()),
                    text(auth.id),
                ],
                SipAuth::ENTITY_TYPE,
                auth.id.to_string(),
            )
            .await
    }
}

#[async_trait]
impl EntityRepository for SqliteSipAuthRepository {
    type Record = SipAuth;

    async fn fetch(&self, id: &Uuid) -> Result<Option<SipAuth>> {
        self.db
            .query_one(
                schema::SELECT_SIP_AUTH_BY_ID,
                vec![text(id)],
                row_to_sip_auth,
                SipAuth::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn insert(&self, auth: &SipAuth) -> Result<()> {
        self.db
            .execute(
                schema::INSERT_SIP_AUTH,
                vec![
                    text(auth.id),
                    text(json_to_sql(&auth.auth_types)?),
                    text(&auth.realm),
                    text(&auth.username),
                    text(&auth.password),
                    text(json_to_sql(&auth.allowed_ips)?),
                    text(self.db.now()),
                    text(DEFAULT_TIMESTAMP),
                ],
                SipAuth::ENTITY_TYPE,
                auth.id.to_string(),
            )
            .await
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.db
            .execute(
                schema::DELETE_SIP_AUTH,
                vec![text(id)],
                SipAuth::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<SipAuth>> {
        let statement = build_list_statement(
            schema::SELECT_SIP_AUTHS,
            schema::SIP_AUTH_FILTERS,
            query,
            &self.db.now(),
        )?;
        self.db
            .query_list(statement, row_to_sip_auth, SipAuth::ENTITY_TYPE)
            .await
    }
}

#[cfg(test)]
mod tests {
    use dbhandler_core::storage::RepositoryError;

    use super::*;
    use crate::test_support::stepping_database;

    #[tokio::test]
    async fn test_delete_removes_row() {
        let repo = SqliteSipAuthRepository::new(stepping_database().await);
        let auth = SipAuth::new("pbx.example.test", "alice", "s3cret");
        repo.insert(&auth).await.unwrap();

        repo.delete(&auth.id).await.unwrap();

        assert!(repo.fetch(&auth.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&auth.id).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_live_filter_works_without_soft_delete() {
        let repo = SqliteSipAuthRepository::new(stepping_database().await);
        let auth = SipAuth::new("pbx.example.test", "alice", "s3cret");
        repo.insert(&auth).await.unwrap();

        let listed = repo.list(&ListQuery::new(10).live_only()).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "alice");
    }
}
