use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::instrument;

use super::model::Workout;
use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    policy::{window, window::TimeRange, ScopedAccess},
    resources::{list_typed, Record, Resource},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(rename = "timeRange")]
    pub time_range: Option<String>,
}

/// Workout history accepts week and month; anything else reads a year.
pub(crate) fn history_range(raw: Option<&str>) -> TimeRange {
    let Some(raw) = raw else {
        return TimeRange::Month;
    };
    match TimeRange::parse(raw) {
        Some(TimeRange::Week) => TimeRange::Week,
        Some(TimeRange::Month) => TimeRange::Month,
        _ => TimeRange::Year,
    }
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<Record<Workout>>>, ApiError> {
    let range = history_range(params.time_range.as_deref());
    let access = ScopedAccess::new(state.records.as_ref(), Workout::TABLE, user_id);
    let workouts = list_typed::<Workout>(&access, range.since(window::today()), None).await?;
    Ok(Json(workouts))
}
