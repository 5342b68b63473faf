use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use time::Date;
use uuid::Uuid;

use super::{ListFilter, RawRecord, RecordStore};
use crate::policy::{
    rules::{format_date, parse_date, FieldKind, FieldRule},
    Table,
};

/// Record store over the tables created by `migrations/`.
#[derive(Clone)]
pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn select_columns(table: &Table) -> String {
    let mut cols = vec!["id", "created_at", "updated_at"];
    if table.is_owned() {
        cols.push("user_id");
    }
    cols.extend(table.columns());
    cols.join(", ")
}

fn order_clause(table: &Table) -> String {
    if table.order.is_empty() {
        return " ORDER BY created_at DESC".into();
    }
    let keys: Vec<String> = table
        .order
        .iter()
        .map(|(col, dir)| format!("{} {}", col, dir.sql()))
        .collect();
    format!(" ORDER BY {}", keys.join(", "))
}

fn decode(table: &Table, row: &PgRow) -> anyhow::Result<RawRecord> {
    let mut fields = Map::new();
    for rule in table.rules {
        let value = match rule.kind {
            FieldKind::Text { .. } | FieldKind::Email | FieldKind::Choice(_) => row
                .try_get::<Option<String>, _>(rule.name)?
                .map(Value::String),
            FieldKind::Number | FieldKind::Decimal { .. } => {
                row.try_get::<Option<f64>, _>(rule.name)?.map(Value::from)
            }
            FieldKind::Integer => row.try_get::<Option<i32>, _>(rule.name)?.map(Value::from),
            FieldKind::Date => row
                .try_get::<Option<Date>, _>(rule.name)?
                .map(|d| Value::String(format_date(d))),
        };
        fields.insert(rule.name.to_string(), value.unwrap_or(Value::Null));
    }

    let owner = if table.is_owned() {
        Some(row.try_get::<Uuid, _>("user_id")?)
    } else {
        None
    };

    Ok(RawRecord {
        id: row.try_get("id")?,
        owner,
        fields,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Bind `value` with the SQL type implied by the rule kind.
fn push_value(
    qb: &mut QueryBuilder<'_, Postgres>,
    rule: &FieldRule,
    value: &Value,
) -> anyhow::Result<()> {
    match rule.kind {
        FieldKind::Text { .. } | FieldKind::Email | FieldKind::Choice(_) => {
            qb.push_bind(value.as_str().map(str::to_owned));
        }
        FieldKind::Number | FieldKind::Decimal { .. } => {
            qb.push_bind(value.as_f64());
        }
        FieldKind::Integer => {
            let n = value
                .as_i64()
                .map(i32::try_from)
                .transpose()
                .with_context(|| format!("{} out of range", rule.name))?;
            qb.push_bind(n);
        }
        FieldKind::Date => {
            let d = match value.as_str() {
                Some(s) => Some(
                    parse_date(s).with_context(|| format!("{} is not a date: {}", rule.name, s))?,
                ),
                None => None,
            };
            qb.push_bind(d);
        }
    }
    Ok(())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list(
        &self,
        table: &'static Table,
        filter: ListFilter,
    ) -> anyhow::Result<Vec<RawRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE TRUE",
            select_columns(table),
            table.name
        ));
        if let (true, Some(owner)) = (table.is_owned(), filter.owner) {
            qb.push(" AND user_id = ").push_bind(owner);
        }
        if let Some(col) = table.date_field {
            if let Some(since) = filter.since {
                qb.push(format!(" AND {col} >= ")).push_bind(since);
            }
            if let Some(until) = filter.until {
                qb.push(format!(" AND {col} <= ")).push_bind(until);
            }
        }
        qb.push(order_clause(table));

        let rows = qb
            .build()
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("list {}", table.name))?;
        rows.iter().map(|row| decode(table, row)).collect()
    }

    async fn fetch(&self, table: &'static Table, id: Uuid) -> anyhow::Result<Option<RawRecord>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            select_columns(table),
            table.name
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("fetch {} {}", table.name, id))?;
        row.map(|r| decode(table, &r)).transpose()
    }

    async fn insert(
        &self,
        table: &'static Table,
        owner: Option<Uuid>,
        fields: Map<String, Value>,
    ) -> anyhow::Result<RawRecord> {
        let owner = match (table.is_owned(), owner) {
            (true, Some(o)) => Some(o),
            (true, None) => anyhow::bail!("{} rows need an owner", table.name),
            (false, _) => None,
        };

        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (id", table.name));
        if owner.is_some() {
            qb.push(", user_id");
        }
        for col in table.columns() {
            qb.push(", ").push(col);
        }
        qb.push(") VALUES (").push_bind(Uuid::new_v4());
        if let Some(o) = owner {
            qb.push(", ").push_bind(o);
        }
        for rule in table.rules {
            qb.push(", ");
            push_value(&mut qb, rule, fields.get(rule.name).unwrap_or(&Value::Null))?;
        }
        qb.push(format!(") RETURNING {}", select_columns(table)));

        let row = qb
            .build()
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("insert {}", table.name))?;
        decode(table, &row)
    }

    async fn update(
        &self,
        table: &'static Table,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> anyhow::Result<Option<RawRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", table.name));
        for rule in table.rules {
            qb.push(rule.name).push(" = ");
            push_value(&mut qb, rule, fields.get(rule.name).unwrap_or(&Value::Null))?;
            qb.push(", ");
        }
        qb.push("updated_at = now() WHERE id = ").push_bind(id);
        qb.push(format!(" RETURNING {}", select_columns(table)));

        let row = qb
            .build()
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("update {} {}", table.name, id))?;
        row.map(|r| decode(table, &r)).transpose()
    }

    async fn delete(&self, table: &'static Table, id: Uuid) -> anyhow::Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table.name);
        let done = sqlx::query(&sql)
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete {} {}", table.name, id))?;
        Ok(done.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::model::Goal;
    use crate::progress::model::ProgressEntry;
    use crate::resources::Resource;

    #[test]
    fn owned_tables_select_user_id() {
        let cols = select_columns(Goal::TABLE);
        assert!(cols.starts_with("id, created_at, updated_at, user_id, title"));
    }

    #[test]
    fn catalog_tables_have_no_owner_column() {
        let cols = select_columns(crate::nutrition::model::Food::TABLE);
        assert!(!cols.contains("user_id"));
    }

    #[test]
    fn order_clause_follows_table() {
        assert_eq!(order_clause(Goal::TABLE), " ORDER BY created_at DESC");
        assert_eq!(order_clause(ProgressEntry::TABLE), " ORDER BY date ASC");
    }
}
