//! The synchronization envelope shared by every entity.

use std::fmt::Display;

use serde::{de::DeserializeOwned, Serialize};

use crate::time::DEFAULT_TIMESTAMP;

/// A value addressable by a stable id inside a cache namespace.
pub trait Keyed: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: Display + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Human readable entity name used in errors and logs.
    const ENTITY_TYPE: &'static str;

    /// Cache key namespace.
    const NAMESPACE: &'static str;

    fn id(&self) -> &Self::Id;
}

/// How a storage-backed entity is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// `tm_delete` is stamped and the row stays readable.
    Soft,
    /// The row is removed.
    Hard,
}

/// A storage-backed record carrying the lifecycle timestamps.
pub trait Record: Keyed {
    const DELETE_MODE: DeleteMode = DeleteMode::Soft;

    fn tm_create(&self) -> &str;
    fn tm_update(&self) -> &str;
    fn tm_delete(&self) -> &str;

    /// True once a soft delete has stamped `tm_delete`.
    fn is_deleted(&self) -> bool {
        self.tm_delete() < DEFAULT_TIMESTAMP
    }

    /// Full cache keys of the secondary slots that point at this record.
    fn secondary_keys(&self) -> Vec<String> {
        Vec::new()
    }
}
