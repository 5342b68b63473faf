use axum::{extract::State, Json};
use serde::Serialize;
use time::Date;
use tracing::{debug, instrument};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    nutrition::model::Meal,
    policy::{window, ScopedAccess},
    resources::{list_typed, Resource},
    state::AppState,
    workouts::model::Workout,
};

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_workouts: usize,
    pub calories: i64,
    pub weekly_workouts: usize,
}

/// `workouts` must already be limited to the last week.
pub(crate) fn summarize(today: Date, workouts: &[Workout], meals: &[Meal]) -> DashboardStats {
    DashboardStats {
        today_workouts: workouts.iter().filter(|w| w.date == today).count(),
        calories: meals
            .iter()
            .filter(|m| m.date == today)
            .map(|m| i64::from(m.calories))
            .sum(),
        weekly_workouts: workouts.len(),
    }
}

#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardStats>, ApiError> {
    let today = window::today();
    let store = state.records.as_ref();

    let workouts = list_typed::<Workout>(
        &ScopedAccess::new(store, Workout::TABLE, user_id),
        Some(window::days_before(today, 7)),
        None,
    )
    .await?;
    let meals = list_typed::<Meal>(
        &ScopedAccess::new(store, Meal::TABLE, user_id),
        Some(today),
        Some(today),
    )
    .await?;

    let workouts: Vec<Workout> = workouts.into_iter().map(|r| r.fields).collect();
    let meals: Vec<Meal> = meals.into_iter().map(|r| r.fields).collect();
    let stats = summarize(today, &workouts, &meals);
    debug!(user_id = %user_id, ?stats, "dashboard stats");
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use super::*;
    use crate::nutrition::model::MealType;

    fn workout(date: Date) -> Workout {
        Workout {
            exercise: "Squat".into(),
            sets: 3,
            reps: 5,
            weight: None,
            date,
            notes: None,
        }
    }

    fn meal(date: Date, calories: i32) -> Meal {
        Meal {
            food: "Rice".into(),
            calories,
            meal_type: MealType::Lunch,
            date,
            notes: String::new(),
        }
    }

    #[test]
    fn counts_today_and_week() {
        let today = date!(2024 - 05 - 20);
        let workouts = [
            workout(today),
            workout(today),
            workout(date!(2024 - 05 - 13)),
        ];
        let meals = [meal(today, 450), meal(today, 300), meal(date!(2024 - 05 - 19), 900)];
        let stats = summarize(today, &workouts, &meals);
        assert_eq!(
            stats,
            DashboardStats {
                today_workouts: 2,
                calories: 750,
                weekly_workouts: 3,
            }
        );
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({"todayWorkouts": 2, "calories": 750, "weeklyWorkouts": 3})
        );
    }
}
