mod dto;
pub mod handlers;
pub mod model;

use axum::{routing::get, Router};

use crate::{resources::crud_routes, state::AppState};
use model::{BodyMeasurement, ProgressEntry};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/progress/progress/weight_history",
            get(handlers::weight_history),
        )
        .route(
            "/progress/progress/nutrition_history",
            get(handlers::nutrition_history),
        )
        .route(
            "/progress/progress/workout_history",
            get(handlers::workout_history),
        )
        .route(
            "/progress/measurements/measurement_history",
            get(handlers::measurement_history),
        )
        .merge(crud_routes::<ProgressEntry>("/progress/progress"))
        .merge(crud_routes::<BodyMeasurement>("/progress/measurements"))
}
