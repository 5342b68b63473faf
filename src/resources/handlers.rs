use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use time::Date;
use tracing::{info, instrument};

use super::{list_typed, parse_id, typed, Record, Resource};
use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    extract::ApiJson,
    policy::{rules::parse_date, window, ScopedAccess},
    state::AppState,
};

/// `GET|POST {path}` and `GET|PUT|PATCH|DELETE {path}/:id` for `R`.
pub fn crud_routes<R: Resource>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, get(list::<R>).post(create::<R>))
        .route(
            &format!("{path}/:id"),
            get(retrieve::<R>)
                .put(update::<R>)
                .patch(update::<R>)
                .delete(destroy::<R>),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub date_from: Option<String>,
}

/// Lower date bound for a plain list: `date_from` when given, else the
/// table's default window. Tables without a window ignore both.
pub(crate) fn list_since(
    days: Option<i64>,
    params: &ListParams,
    today: Date,
) -> Result<Option<Date>, ApiError> {
    let Some(days) = days else {
        return Ok(None);
    };
    match params.date_from.as_deref() {
        Some(raw) => parse_date(raw).map(Some).ok_or_else(|| {
            ApiError::field(
                "date_from",
                "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
            )
        }),
        None => Ok(Some(window::days_before(today, days))),
    }
}

#[instrument(skip(state, params), fields(kind = R::TABLE.label))]
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Record<R>>>, ApiError> {
    let since = list_since(R::TABLE.list_window_days, &params, window::today())?;
    let access = ScopedAccess::new(state.records.as_ref(), R::TABLE, user_id);
    Ok(Json(list_typed::<R>(&access, since, None).await?))
}

#[instrument(skip(state), fields(kind = R::TABLE.label))]
pub async fn retrieve<R: Resource>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Record<R>>, ApiError> {
    let id = parse_id(R::TABLE, &id)?;
    let access = ScopedAccess::new(state.records.as_ref(), R::TABLE, user_id);
    let raw = access.retrieve(id).await?;
    Ok(Json(typed(raw)?))
}

#[instrument(skip(state, payload), fields(kind = R::TABLE.label))]
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<Record<R>>), ApiError> {
    let access = ScopedAccess::new(state.records.as_ref(), R::TABLE, user_id);
    let raw = access.create(&payload).await?;
    info!(user_id = %user_id, id = %raw.id, kind = R::TABLE.label, "record created");
    Ok((StatusCode::CREATED, Json(typed(raw)?)))
}

/// PUT and PATCH both merge the payload over the stored record.
#[instrument(skip(state, payload), fields(kind = R::TABLE.label))]
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<Record<R>>, ApiError> {
    let id = parse_id(R::TABLE, &id)?;
    let access = ScopedAccess::new(state.records.as_ref(), R::TABLE, user_id);
    let raw = access.update(id, &payload).await?;
    info!(user_id = %user_id, id = %id, kind = R::TABLE.label, "record updated");
    Ok(Json(typed(raw)?))
}

#[instrument(skip(state), fields(kind = R::TABLE.label))]
pub async fn destroy<R: Resource>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(R::TABLE, &id)?;
    let access = ScopedAccess::new(state.records.as_ref(), R::TABLE, user_id);
    access.delete(id).await?;
    info!(user_id = %user_id, id = %id, kind = R::TABLE.label, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn list_window_defaults_to_table_days() {
        let today = date!(2024 - 03 - 10);
        let since = list_since(Some(7), &ListParams::default(), today).unwrap();
        assert_eq!(since, Some(date!(2024 - 03 - 03)));
    }

    #[test]
    fn date_from_overrides_window() {
        let params = ListParams {
            date_from: Some("2023-12-25".into()),
        };
        let since = list_since(Some(7), &params, date!(2024 - 03 - 10)).unwrap();
        assert_eq!(since, Some(date!(2023 - 12 - 25)));
    }

    #[test]
    fn bad_date_from_is_rejected() {
        let params = ListParams {
            date_from: Some("last week".into()),
        };
        assert!(matches!(
            list_since(Some(7), &params, date!(2024 - 03 - 10)),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn unwindowed_tables_ignore_date_from() {
        let params = ListParams {
            date_from: Some("2024-01-01".into()),
        };
        assert_eq!(list_since(None, &params, date!(2024 - 03 - 10)).unwrap(), None);
    }
}
