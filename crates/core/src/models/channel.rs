use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{Keyed, Record};
use crate::serde_helpers::null_as_default;
use crate::time::DEFAULT_TIMESTAMP;

/// Media-server channel state as reported by the switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    #[default]
    Unknown,
    Down,
    Ring,
    Ringing,
    Up,
    Busy,
}

/// A media-server channel. The id is assigned by the switch, not by us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Channel technology (`PJSIP`, `Snoop`, ...).
    pub tech: String,
    pub bridge_id: String,
    /// Empty until the channel has entered the application.
    pub stasis_name: String,
    pub state: ChannelState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: BTreeMap<String, serde_json::Value>,
    /// Q.850 cause code. Zero while the channel is up.
    pub hangup_cause: i64,
    pub tm_answer: String,
    pub tm_ringing: String,
    pub tm_end: String,
    pub tm_create: String,
    pub tm_update: String,
    pub tm_delete: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tech: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tech: tech.into(),
            bridge_id: String::new(),
            stasis_name: String::new(),
            state: ChannelState::Down,
            data: BTreeMap::new(),
            hangup_cause: 0,
            tm_answer: DEFAULT_TIMESTAMP.to_string(),
            tm_ringing: DEFAULT_TIMESTAMP.to_string(),
            tm_end: DEFAULT_TIMESTAMP.to_string(),
            tm_create: DEFAULT_TIMESTAMP.to_string(),
            tm_update: DEFAULT_TIMESTAMP.to_string(),
            tm_delete: DEFAULT_TIMESTAMP.to_string(),
        }
    }

    pub fn with_stasis_name(mut self, stasis_name: impl Into<String>) -> Self {
        self.stasis_name = stasis_name.into();
        self
    }

    pub fn in_stasis(&self) -> bool {
        !self.stasis_name.is_empty()
    }
}

impl Keyed for Channel {
    type Id = String;

    const ENTITY_TYPE: &'static str = "Channel";
    const NAMESPACE: &'static str = "channel";

    fn id(&self) -> &String {
        &self.id
    }
}

impl Record for Channel {
    lifecycle_timestamps!();
}
