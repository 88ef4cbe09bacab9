//! Media-server channels.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dbhandler_core::cache::Cache;
use dbhandler_core::models::{Channel, ChannelState};
use dbhandler_core::storage::{ListQuery, Result};
use dbhandler_core::Keyed;

use super::coordinator::CacheAside;
use super::poll::poll_until;
use crate::storage::sqlite::{Database, SqliteChannelRepository};

/// Cached access to channels.
#[derive(Clone)]
pub struct ChannelHandler {
    channels: CacheAside<SqliteChannelRepository>,
    poll_interval: Duration,
}

impl ChannelHandler {
    pub fn new(
        db: Database,
        cache: Arc<dyn Cache>,
        ttl: Option<Duration>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            channels: CacheAside::new(Arc::new(SqliteChannelRepository::new(db)), cache, ttl),
            poll_interval,
        }
    }

    pub async fn create(&self, channel: &Channel) -> Result<()> {
        self.channels.create(channel).await
    }

    pub async fn get(&self, id: &str) -> Result<Channel> {
        self.channels.get(&id.to_string()).await
    }

    /// Waits for a channel that the event handler has not stored yet.
    pub async fn get_until_timeout(&self, id: &str, timeout: Duration) -> Result<Channel> {
        self.poll(id, timeout, |_| true).await
    }

    /// Waits until the channel exists and has entered the application.
    pub async fn get_until_timeout_with_stasis(
        &self,
        id: &str,
        timeout: Duration,
    ) -> Result<Channel> {
        self.poll(id, timeout, Channel::in_stasis).await
    }

    async fn poll<P>(&self, id: &str, timeout: Duration, accept: P) -> Result<Channel>
    where
        P: Fn(&Channel) -> bool,
    {
        let channels = &self.channels;
        let key = id.to_string();
        let key = &key;

        poll_until(
            Channel::ENTITY_TYPE,
            id,
            timeout,
            self.poll_interval,
            || async move { channels.get(key).await },
            accept,
        )
        .await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Channel>> {
        self.channels.list(query).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.channels.delete(&id.to_string()).await
    }

    pub async fn set_stasis_name(&self, id: &str, stasis_name: &str) -> Result<()> {
        let repo = self.channels.repository();
        self.channels
            .update(&id.to_string(), repo.set_stasis_name(id, stasis_name))
            .await
    }

    pub async fn set_bridge_id(&self, id: &str, bridge_id: &str) -> Result<()> {
        let repo = self.channels.repository();
        self.channels
            .update(&id.to_string(), repo.set_bridge_id(id, bridge_id))
            .await
    }

    pub async fn set_state(&self, id: &str, state: ChannelState) -> Result<()> {
        let repo = self.channels.repository();
        self.channels
            .update(&id.to_string(), repo.set_state(id, state))
            .await
    }

    pub async fn set_state_answer(&self, id: &str, state: ChannelState) -> Result<()> {
        let repo = self.channels.repository();
        self.channels
            .update(&id.to_string(), repo.set_state_answer(id, state))
            .await
    }

    pub async fn set_state_ringing(&self, id: &str, state: ChannelState) -> Result<()> {
        let repo = self.channels.repository();
        self.channels
            .update(&id.to_string(), repo.set_state_ringing(id, state))
            .await
    }

    pub async fn set_data(&self, id: &str, data: &BTreeMap<String, serde_json::Value>) -> Result<()> {
        let repo = self.channels.repository();
        self.channels
            .update(&id.to_string(), repo.set_data(id, data))
            .await
    }

    /// Sets one key of the channel's data map.
    pub async fn set_data_item(&self, id: &str, key: &str, value: &serde_json::Value) -> Result<()> {
        let repo = self.channels.repository();
        self.channels
            .update(&id.to_string(), repo.set_data_item(id, key, value))
            .await
    }

    /// Stores the hangup cause and ends the channel.
    pub async fn set_hangup(&self, id: &str, hangup_cause: i64) -> Result<()> {
        let repo = self.channels.repository();
        self.channels
            .update(&id.to_string(), repo.set_hangup(id, hangup_cause))
            .await
    }
}
