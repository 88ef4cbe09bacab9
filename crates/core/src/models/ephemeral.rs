//! Short-lived values kept only in the cache.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Keyed;

/// RTP bridge between a call and an external media endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalMedia {
    pub id: Uuid,
    pub call_id: Uuid,
    pub local_ip: String,
    pub local_port: u16,
    pub external_host: String,
    pub encapsulation: String,
    pub transport: String,
    pub format: String,
}

impl Keyed for ExternalMedia {
    type Id = Uuid;

    const ENTITY_TYPE: &'static str = "ExternalMedia";
    const NAMESPACE: &'static str = "external_media";

    fn id(&self) -> &Uuid {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmdStatus {
    Human,
    Machine,
    #[serde(rename = "notsure")]
    NotSure,
}

/// Answering machine detection outcome of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmdResult {
    pub call_id: Uuid,
    pub status: AmdStatus,
    pub cause: String,
}

impl Keyed for AmdResult {
    type Id = Uuid;

    const ENTITY_TYPE: &'static str = "AmdResult";
    const NAMESPACE: &'static str = "amd";

    fn id(&self) -> &Uuid {
        &self.call_id
    }
}

/// DTMF digits received on a call and not consumed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtmfBuffer {
    pub call_id: Uuid,
    pub digits: String,
}

impl DtmfBuffer {
    pub fn empty(call_id: Uuid) -> Self {
        Self {
            call_id,
            digits: String::new(),
        }
    }
}

impl Keyed for DtmfBuffer {
    type Id = Uuid;

    const ENTITY_TYPE: &'static str = "DtmfBuffer";
    const NAMESPACE: &'static str = "dtmf";

    fn id(&self) -> &Uuid {
        &self.call_id
    }
}
