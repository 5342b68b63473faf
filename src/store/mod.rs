use async_trait::async_trait;
use serde_json::{Map, Value};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::policy::Table;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// A stored row, with client-visible columns kept as normalized JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: Uuid,
    pub owner: Option<Uuid>,
    pub fields: Map<String, Value>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Row selection for list reads. Date bounds are inclusive and apply to the
/// table's `date_field`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub owner: Option<Uuid>,
    pub since: Option<Date>,
    pub until: Option<Date>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching `filter`, in the table's declared order.
    async fn list(&self, table: &'static Table, filter: ListFilter)
        -> anyhow::Result<Vec<RawRecord>>;

    async fn fetch(&self, table: &'static Table, id: Uuid) -> anyhow::Result<Option<RawRecord>>;

    async fn insert(
        &self,
        table: &'static Table,
        owner: Option<Uuid>,
        fields: Map<String, Value>,
    ) -> anyhow::Result<RawRecord>;

    /// Replace the client-visible columns; `None` when the row is gone.
    async fn update(
        &self,
        table: &'static Table,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> anyhow::Result<Option<RawRecord>>;

    /// `false` when nothing was deleted.
    async fn delete(&self, table: &'static Table, id: Uuid) -> anyhow::Result<bool>;
}
