//! Generic CRUD surface shared by every record kind.
//!
//! A kind implements [`Resource`] by pointing at its static table; the
//! handlers here then give it list/create/retrieve/update/delete routes with
//! ownership scoping and validation applied by [`ScopedAccess`].

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    error::ApiError,
    policy::{ScopedAccess, Table},
    store::RawRecord,
};

pub mod handlers;

pub use handlers::crud_routes;

pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static Table;
}

/// A stored resource as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Record<R> {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: R,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl<R: Resource> TryFrom<RawRecord> for Record<R> {
    type Error = anyhow::Error;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let fields = serde_json::from_value(Value::Object(raw.fields))
            .with_context(|| format!("decode {} {}", R::TABLE.name, raw.id))?;
        Ok(Self {
            id: raw.id,
            fields,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

pub(crate) fn typed<R: Resource>(raw: RawRecord) -> Result<Record<R>, ApiError> {
    Record::try_from(raw).map_err(ApiError::internal)
}

/// Path ids that are not UUIDs cannot match any record.
pub(crate) fn parse_id(table: &Table, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::NotFound(format!("No {} matches the given query.", table.label)))
}

/// The caller's records of kind `R` with their date in `[since, until]`.
pub(crate) async fn list_typed<R: Resource>(
    access: &ScopedAccess<'_>,
    since: Option<Date>,
    until: Option<Date>,
) -> Result<Vec<Record<R>>, ApiError> {
    access
        .list(since, until)
        .await?
        .into_iter()
        .map(typed::<R>)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::goals::model::Goal;

    #[test]
    fn record_flattens_fields() {
        let mut fields = serde_json::Map::new();
        for (k, v) in [
            ("title", json!("Run 5k")),
            ("description", json!("")),
            ("category", json!("workout")),
            ("target", json!(5.0)),
            ("current", json!(0)),
            ("unit", json!("km")),
            ("start_date", json!("2024-01-01")),
            ("end_date", json!("2024-02-01")),
            ("status", json!("not_started")),
        ] {
            fields.insert(k.into(), v);
        }
        let raw = RawRecord {
            id: Uuid::new_v4(),
            owner: Some(Uuid::new_v4()),
            fields,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let id = raw.id;
        let record: Record<Goal> = raw.try_into().expect("decode");
        let body = serde_json::to_value(&record).unwrap();
        assert_eq!(body["id"], json!(id.to_string()));
        assert_eq!(body["title"], json!("Run 5k"));
        assert_eq!(body["start_date"], json!("2024-01-01"));
        assert_eq!(body["created_at"], json!("1970-01-01T00:00:00Z"));
        assert!(body.get("user").is_none());
        assert!(body.get("owner").is_none());
    }

    #[test]
    fn malformed_id_is_not_found() {
        let err = parse_id(Goal::TABLE, "42").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(parse_id(Goal::TABLE, &Uuid::new_v4().to_string()).is_ok());
    }
}
