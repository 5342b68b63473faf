pub mod model;

use axum::Router;

use crate::{resources::crud_routes, state::AppState};
use model::{Food, Meal};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(crud_routes::<Food>("/nutrition/foods"))
        .merge(crud_routes::<Meal>("/nutrition/meals"))
}
