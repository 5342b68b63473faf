use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{ListFilter, RawRecord, RecordStore};
use crate::policy::{rules::format_date, Direction, Table};

/// In-process record store keyed by table name.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<&'static str, Vec<RawRecord>>>,
}

impl MemoryRecordStore {
    pub fn len(&self, table: &Table) -> usize {
        self.tables
            .lock()
            .expect("memory store poisoned")
            .get(table.name)
            .map_or(0, Vec::len)
    }

    /// Insert a fully formed record, bypassing validation.
    pub fn seed(&self, table: &Table, record: RawRecord) {
        self.tables
            .lock()
            .expect("memory store poisoned")
            .entry(table.name)
            .or_default()
            .push(record);
    }
}

fn compare(a: &RawRecord, b: &RawRecord, col: &str) -> Ordering {
    match col {
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => compare_values(a.fields.get(col), b.fields.get(col)),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, _) => Ordering::Less,
        (_, Some(Value::Null) | None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn in_window(table: &Table, record: &RawRecord, filter: &ListFilter) -> bool {
    let Some(col) = table.date_field else {
        return true;
    };
    let day = record.fields.get(col).and_then(Value::as_str).unwrap_or("");
    let after = filter.since.map_or(true, |s| day >= format_date(s).as_str());
    let before = filter.until.map_or(true, |u| day <= format_date(u).as_str());
    after && before
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(
        &self,
        table: &'static Table,
        filter: ListFilter,
    ) -> anyhow::Result<Vec<RawRecord>> {
        let tables = self.tables.lock().expect("memory store poisoned");
        let mut rows: Vec<RawRecord> = tables
            .get(table.name)
            .into_iter()
            .flatten()
            .filter(|r| !table.is_owned() || filter.owner.map_or(true, |o| r.owner == Some(o)))
            .filter(|r| in_window(table, r, &filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            table
                .order
                .iter()
                .map(|(col, dir)| match dir {
                    Direction::Asc => compare(a, b, col),
                    Direction::Desc => compare(b, a, col),
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(rows)
    }

    async fn fetch(&self, table: &'static Table, id: Uuid) -> anyhow::Result<Option<RawRecord>> {
        let tables = self.tables.lock().expect("memory store poisoned");
        Ok(tables
            .get(table.name)
            .and_then(|rows| rows.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn insert(
        &self,
        table: &'static Table,
        owner: Option<Uuid>,
        fields: Map<String, Value>,
    ) -> anyhow::Result<RawRecord> {
        if table.is_owned() && owner.is_none() {
            anyhow::bail!("{} rows need an owner", table.name);
        }
        let now = OffsetDateTime::now_utc();
        let record = RawRecord {
            id: Uuid::new_v4(),
            owner: if table.is_owned() { owner } else { None },
            fields,
            created_at: now,
            updated_at: now,
        };
        self.seed(table, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        table: &'static Table,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> anyhow::Result<Option<RawRecord>> {
        let mut tables = self.tables.lock().expect("memory store poisoned");
        let Some(row) = tables
            .get_mut(table.name)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
        else {
            return Ok(None);
        };
        row.fields = fields;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, table: &'static Table, id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().expect("memory store poisoned");
        let Some(rows) = tables.get_mut(table.name) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }
}
