use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::secondary_key;
use crate::record::{Keyed, Record};
use crate::serde_helpers::null_as_default;
use crate::time::DEFAULT_TIMESTAMP;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallType {
    #[default]
    #[serde(rename = "")]
    None,
    Flow,
    Conference,
    SipService,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    #[default]
    Dialing,
    Ringing,
    Progressing,
    Terminating,
    Canceling,
    Hangup,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    #[serde(rename = "")]
    None,
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HangupBy {
    #[default]
    #[serde(rename = "")]
    None,
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HangupReason {
    #[default]
    #[serde(rename = "")]
    None,
    Normal,
    Failed,
    Busy,
    #[serde(rename = "cancel")]
    Canceled,
    Timeout,
    #[serde(rename = "noanswer")]
    NoAnswer,
    Dialout,
    Amd,
}

/// One end of a call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// `tel`, `sip`, `agent`, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    #[serde(default)]
    pub target_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub detail: String,
}

impl Address {
    pub fn new(kind: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: target.into(),
            ..Self::default()
        }
    }
}

/// A call leg tracked by the call manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Media-server channel carrying this call. Empty once detached.
    pub channel_id: String,
    pub bridge_id: String,
    pub flow_id: Uuid,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub status: CallStatus,
    pub direction: Direction,
    pub source: Address,
    pub destination: Address,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: BTreeMap<String, String>,
    /// Nil when the call has no master.
    pub master_call_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chained_call_ids: Vec<Uuid>,
    /// Recording currently in progress. Nil when not recording.
    pub recording_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recording_ids: Vec<Uuid>,
    pub hangup_by: HangupBy,
    pub hangup_reason: HangupReason,
    pub tm_ringing: String,
    pub tm_progressing: String,
    pub tm_hangup: String,
    pub tm_create: String,
    pub tm_update: String,
    pub tm_delete: String,
}

impl Call {
    pub fn new(customer_id: Uuid, channel_id: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            channel_id: channel_id.into(),
            bridge_id: String::new(),
            flow_id: Uuid::nil(),
            call_type: CallType::Flow,
            status: CallStatus::Dialing,
            direction,
            source: Address::default(),
            destination: Address::default(),
            data: BTreeMap::new(),
            master_call_id: Uuid::nil(),
            chained_call_ids: Vec::new(),
            recording_id: Uuid::nil(),
            recording_ids: Vec::new(),
            hangup_by: HangupBy::None,
            hangup_reason: HangupReason::None,
            tm_ringing: DEFAULT_TIMESTAMP.to_string(),
            tm_progressing: DEFAULT_TIMESTAMP.to_string(),
            tm_hangup: DEFAULT_TIMESTAMP.to_string(),
            tm_create: DEFAULT_TIMESTAMP.to_string(),
            tm_update: DEFAULT_TIMESTAMP.to_string(),
            tm_delete: DEFAULT_TIMESTAMP.to_string(),
        }
    }

    pub fn with_addresses(mut self, source: Address, destination: Address) -> Self {
        self.source = source;
        self.destination = destination;
        self
    }

    pub fn with_flow_id(mut self, flow_id: Uuid) -> Self {
        self.flow_id = flow_id;
        self
    }

    pub fn with_call_type(mut self, call_type: CallType) -> Self {
        self.call_type = call_type;
        self
    }

    /// Cache key of the channel lookup slot.
    pub fn channel_key(channel_id: &str) -> String {
        secondary_key(Self::NAMESPACE, "channel_id", channel_id)
    }
}

impl Keyed for Call {
    type Id = Uuid;

    const ENTITY_TYPE: &'static str = "Call";
    const NAMESPACE: &'static str = "call";

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Record for Call {
    lifecycle_timestamps!();

    fn secondary_keys(&self) -> Vec<String> {
        if self.channel_id.is_empty() {
            return Vec::new();
        }
        vec![Self::channel_key(&self.channel_id)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&CallType::SipService).unwrap(), "\"sip-service\"");
        assert_eq!(serde_json::to_string(&HangupReason::NoAnswer).unwrap(), "\"noanswer\"");
        assert_eq!(serde_json::to_string(&HangupReason::Canceled).unwrap(), "\"cancel\"");
        assert_eq!(serde_json::to_string(&HangupBy::None).unwrap(), "\"\"");
    }

    #[test]
    fn test_address_type_field_name() {
        let address = Address::new("tel", "+15551230000");
        let value = serde_json::to_value(&address).unwrap();
        assert_eq!(value["type"], "tel");
    }

    #[test]
    fn test_channel_secondary_key() {
        let call = Call::new(Uuid::new_v4(), "1700000000.1", Direction::Incoming);
        assert_eq!(call.secondary_keys(), vec!["call:channel_id:1700000000.1"]);
    }
}
