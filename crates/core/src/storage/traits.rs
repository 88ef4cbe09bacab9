use async_trait::async_trait;

use crate::record::{Keyed, Record};

use super::{ListQuery, Result};

/// Id type of the record a repository manages.
pub type RecordId<E> = <<E as EntityRepository>::Record as Keyed>::Id;

/// Storage operations every entity repository provides.
///
/// Entity specific updates (`set_status`, `add_balance`, ...) are inherent
/// methods on the concrete repositories.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    type Record: Record;

    /// Reads one record by id. Soft deleted records are returned as well.
    async fn fetch(&self, id: &<Self::Record as Keyed>::Id) -> Result<Option<Self::Record>>;

    /// Inserts a new record. Lifecycle timestamps are assigned by storage.
    async fn insert(&self, record: &Self::Record) -> Result<()>;

    /// Soft or hard deletes a record depending on its `DELETE_MODE`.
    async fn delete(&self, id: &<Self::Record as Keyed>::Id) -> Result<()>;

    /// Returns one page of records, newest first.
    async fn list(&self, query: &ListQuery) -> Result<Vec<Self::Record>>;
}
