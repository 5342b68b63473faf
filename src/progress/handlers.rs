use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{MeasurementPoint, NutritionPoint, WeightPoint, WorkoutPoint},
    model::{BodyMeasurement, ProgressEntry},
};
use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    policy::{window, window::TimeRange, ScopedAccess},
    resources::{list_typed, Resource},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(rename = "timeRange")]
    pub time_range: Option<String>,
}

impl HistoryParams {
    /// Defaults to every record; unknown ranges are rejected.
    fn range(&self) -> Result<TimeRange, ApiError> {
        match self.time_range.as_deref() {
            None => Ok(TimeRange::All),
            Some(raw) => TimeRange::parse(raw)
                .ok_or_else(|| ApiError::field("timeRange", format!("\"{raw}\" is not a valid choice."))),
        }
    }
}

/// Caller's `R` records inside the requested range, oldest first, each
/// projected to `P`.
async fn project<R, P>(
    state: &AppState,
    user_id: Uuid,
    params: &HistoryParams,
) -> Result<Vec<P>, ApiError>
where
    R: Resource,
    P: From<R>,
{
    let since = params.range()?.since(window::today());
    let access = ScopedAccess::new(state.records.as_ref(), R::TABLE, user_id);
    let records = list_typed::<R>(&access, since, None).await?;
    Ok(records.into_iter().map(|r| P::from(r.fields)).collect())
}

#[instrument(skip(state))]
pub async fn weight_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<WeightPoint>>, ApiError> {
    Ok(Json(project::<ProgressEntry, _>(&state, user_id, &params).await?))
}

#[instrument(skip(state))]
pub async fn nutrition_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<NutritionPoint>>, ApiError> {
    Ok(Json(project::<ProgressEntry, _>(&state, user_id, &params).await?))
}

#[instrument(skip(state))]
pub async fn workout_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<WorkoutPoint>>, ApiError> {
    Ok(Json(project::<ProgressEntry, _>(&state, user_id, &params).await?))
}

#[instrument(skip(state))]
pub async fn measurement_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<MeasurementPoint>>, ApiError> {
    Ok(Json(
        project::<BodyMeasurement, _>(&state, user_id, &params).await?,
    ))
}
