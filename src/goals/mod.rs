pub mod model;

use axum::Router;

use crate::{resources::crud_routes, state::AppState};

pub fn router() -> Router<AppState> {
    crud_routes::<model::Goal>("/goals")
}
