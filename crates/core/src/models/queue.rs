use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{Keyed, Record};
use crate::serde_helpers::null_as_default;
use crate::time::DEFAULT_TIMESTAMP;

/// How a queue picks the agent for the next waiting call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMethod {
    #[default]
    #[serde(rename = "")]
    None,
    Random,
}

/// A call queue together with its live membership and statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub name: String,
    pub detail: String,
    pub routing_method: RoutingMethod,
    /// Agent tags eligible to serve this queue.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_ids: Vec<Uuid>,
    /// Flow actions played to waiting callers. Opaque to this layer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub wait_actions: Vec<serde_json::Value>,
    /// Milliseconds.
    pub wait_timeout: i64,
    /// Milliseconds.
    pub service_timeout: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wait_queuecall_ids: Vec<Uuid>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_queuecall_ids: Vec<Uuid>,
    pub total_incoming_count: i64,
    pub total_serviced_count: i64,
    pub total_abandoned_count: i64,
    /// Accumulated waiting time of serviced and abandoned calls, in milliseconds.
    pub total_wait_duration: i64,
    /// Accumulated service time, in milliseconds.
    pub total_service_duration: i64,
    pub tm_create: String,
    pub tm_update: String,
    pub tm_delete: String,
}

impl Queue {
    pub fn new(customer_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            name: name.into(),
            detail: String::new(),
            routing_method: RoutingMethod::None,
            tag_ids: Vec::new(),
            wait_actions: Vec::new(),
            wait_timeout: 0,
            service_timeout: 0,
            wait_queuecall_ids: Vec::new(),
            service_queuecall_ids: Vec::new(),
            total_incoming_count: 0,
            total_serviced_count: 0,
            total_abandoned_count: 0,
            total_wait_duration: 0,
            total_service_duration: 0,
            tm_create: DEFAULT_TIMESTAMP.to_string(),
            tm_update: DEFAULT_TIMESTAMP.to_string(),
            tm_delete: DEFAULT_TIMESTAMP.to_string(),
        }
    }

    pub fn with_routing_method(mut self, routing_method: RoutingMethod) -> Self {
        self.routing_method = routing_method;
        self
    }

    pub fn with_tag_ids(mut self, tag_ids: Vec<Uuid>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn with_wait_actions(mut self, wait_actions: Vec<serde_json::Value>) -> Self {
        self.wait_actions = wait_actions;
        self
    }

    pub fn with_timeouts(mut self, wait_timeout: i64, service_timeout: i64) -> Self {
        self.wait_timeout = wait_timeout;
        self.service_timeout = service_timeout;
        self
    }
}

impl Keyed for Queue {
    type Id = Uuid;

    const ENTITY_TYPE: &'static str = "Queue";
    const NAMESPACE: &'static str = "queue";

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Record for Queue {
    lifecycle_timestamps!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_method_wire_names() {
        assert_eq!(serde_json::to_string(&RoutingMethod::Random).unwrap(), "\"random\"");
        assert_eq!(serde_json::to_string(&RoutingMethod::None).unwrap(), "\"\"");
    }
}
