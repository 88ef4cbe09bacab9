use std::collections::BTreeMap;

use async_trait::async_trait;
use rusqlite::types::Value;

use dbhandler_core::models::{Channel, ChannelState};
use dbhandler_core::storage::{
    build_list_statement, EntityRepository, ListQuery, RepositoryError, Result,
};
use dbhandler_core::time::DEFAULT_TIMESTAMP;
use dbhandler_core::Keyed;

use super::conversions::{enum_to_sql, json_to_sql, row_to_channel};
use super::database::{text, Database};
use super::schema;

/// Media-server channels in SQLite. Ids are the switch's channel ids.
#[derive(Clone)]
pub struct SqliteChannelRepository {
    db: Database,
}

impl SqliteChannelRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn update(&self, sql: &'static str, id: &str, mut params: Vec<Value>) -> Result<()> {
        params.push(text(self.db.now()));
        params.push(text(id));
        self.db
            .execute(sql, params, Channel::ENTITY_TYPE, id.to_string())
            .await
    }

    pub async fn set_stasis_name(&self, id: &str, stasis_name: &str) -> Result<()> {
        self.update(schema::UPDATE_CHANNEL_STASIS_NAME, id, vec![text(stasis_name)])
            .await
    }

    pub async fn set_bridge_id(&self, id: &str, bridge_id: &str) -> Result<()> {
        self.update(schema::UPDATE_CHANNEL_BRIDGE_ID, id, vec![text(bridge_id)])
            .await
    }

    pub async fn set_state(&self, id: &str, state: ChannelState) -> Result<()> {
        self.update(schema::UPDATE_CHANNEL_STATE, id, vec![text(enum_to_sql(&state)?)])
            .await
    }

    /// Sets the state and stamps `tm_answer`.
    pub async fn set_state_answer(&self, id: &str, state: ChannelState) -> Result<()> {
        self.update(
            schema::UPDATE_CHANNEL_STATE_ANSWER,
            id,
            vec![text(enum_to_sql(&state)?)],
        )
        .await
    }

    /// Sets the state and stamps `tm_ringing`.
    pub async fn set_state_ringing(&self, id: &str, state: ChannelState) -> Result<()> {
        self.update(
            schema::UPDATE_CHANNEL_STATE_RINGING,
            id,
            vec![text(enum_to_sql(&state)?)],
        )
        .await
    }

    pub async fn set_data(
        &self,
        id: &str,
        data: &BTreeMap<String, serde_json::Value>,
    ) -> Result<()> {
        self.update(schema::UPDATE_CHANNEL_DATA, id, vec![text(json_to_sql(data)?)])
            .await
    }

    /// Sets a single top-level key of `data`, leaving the others intact.
    pub async fn set_data_item(
        &self,
        id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        if key.is_empty() || key.contains('"') {
            return Err(RepositoryError::Marshal(format!(
                "invalid channel data key: {key:?}"
            )));
        }
        let path = format!("$.\"{key}\"");
        self.update(
            schema::UPDATE_CHANNEL_DATA_ITEM,
            id,
            vec![text(path), text(json_to_sql(value)?)],
        )
        .await
    }

    /// Records the hangup cause and soft deletes the channel.
    pub async fn set_hangup(&self, id: &str, hangup_cause: i64) -> Result<()> {
        let now = self.db.now();
        self.db
            .execute(
                schema::UPDATE_CHANNEL_HANGUP,
                vec![Value::Integer(hangup_cause), text(now), text(id)],
                Channel::ENTITY_TYPE,
                id.to_string(),
            )
            .await
    }
}

#[async_trait]
impl EntityRepository for SqliteChannelRepository {
    type Record = Channel;

    async fn fetch(&self, id: &String) -> Result<Option<Channel>> {
        self.db
            .query_one(
                schema::SELECT_CHANNEL_BY_ID,
                vec![text(id)],
                row_to_channel,
                Channel::ENTITY_TYPE,
                id.clone(),
            )
            .await
    }

    async fn insert(&self, channel: &Channel) -> Result<()> {
        self.db
            .execute(
                schema::INSERT_CHANNEL,
                vec![
                    text(&channel.id),
                    text(&channel.name),
                    text(&channel.tech),
                    text(&channel.bridge_id),
                    text(&channel.stasis_name),
                    text(enum_to_sql(&channel.state)?),
                    text(json_to_sql(&channel.data)?),
                    Value::Integer(channel.hangup_cause),
                    text(DEFAULT_TIMESTAMP),
                    text(self.db.now()),
                ],
                Channel::ENTITY_TYPE,
                channel.id.clone(),
            )
            .await
    }

    async fn delete(&self, id: &String) -> Result<()> {
        self.db
            .execute(
                schema::DELETE_CHANNEL,
                vec![text(self.db.now()), text(id)],
                Channel::ENTITY_TYPE,
                id.clone(),
            )
            .await
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Channel>> {
        let statement = build_list_statement(
            schema::SELECT_CHANNELS,
            schema::CHANNEL_FILTERS,
            query,
            &self.db.now(),
        )?;
        self.db
            .query_list(statement, row_to_channel, Channel::ENTITY_TYPE)
            .await
    }
}
