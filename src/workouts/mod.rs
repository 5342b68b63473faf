pub mod handlers;
pub mod model;

use axum::{routing::get, Router};

use crate::{resources::crud_routes, state::AppState};
use model::{Exercise, WeightEntry, Workout};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/workouts/workouts/history", get(handlers::history))
        .merge(crud_routes::<Workout>("/workouts/workouts"))
        .merge(crud_routes::<WeightEntry>("/workouts/weights"))
        .merge(crud_routes::<Exercise>("/workouts/exercises"))
}
