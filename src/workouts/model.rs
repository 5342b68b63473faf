use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    policy::{Access, Direction, FailureClass, FieldRule, Table},
    resources::Resource,
};

const AT_LEAST_ONE: &str = "Ensure this value is greater than or equal to 1.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub exercise: String,
    pub sets: i32,
    pub reps: i32,
    pub weight: Option<f64>,
    pub date: Date,
    pub notes: Option<String>,
}

const WORKOUT_RULES: &[FieldRule] = &[
    FieldRule::text("exercise", 200),
    FieldRule::integer("sets").at_least(1, AT_LEAST_ONE),
    FieldRule::integer("reps").at_least(1, AT_LEAST_ONE),
    FieldRule::decimal("weight", 6, 2).optional(),
    FieldRule::date("date"),
    FieldRule::long_text("notes").blank().optional(),
];

/// Plain lists default to the last week; a failed insert is a server fault.
const WORKOUTS: Table = Table {
    name: "workouts",
    label: "workout",
    access: Access::Owned,
    rules: WORKOUT_RULES,
    date_field: Some("date"),
    order: &[("date", Direction::Desc), ("created_at", Direction::Desc)],
    list_window_days: Some(7),
    create_failure: FailureClass::Server,
};

impl Resource for Workout {
    const TABLE: &'static Table = &WORKOUTS;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: Date,
    pub weight: f64,
}

const WEIGHT_RULES: &[FieldRule] = &[FieldRule::date("date"), FieldRule::number("weight")];

const WEIGHT_ENTRIES: Table = Table {
    name: "weight_entries",
    label: "weight entry",
    access: Access::Owned,
    rules: WEIGHT_RULES,
    date_field: Some("date"),
    order: &[("date", Direction::Desc)],
    list_window_days: None,
    create_failure: FailureClass::Client,
};

impl Resource for WeightEntry {
    const TABLE: &'static Table = &WEIGHT_ENTRIES;
}

/// Shared exercise library entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub description: String,
    pub muscle_group: String,
    pub equipment: String,
    pub instructions: String,
}

const EXERCISE_RULES: &[FieldRule] = &[
    FieldRule::text("name", 200),
    FieldRule::long_text("description"),
    FieldRule::text("muscle_group", 100),
    FieldRule::text("equipment", 200),
    FieldRule::long_text("instructions"),
];

const EXERCISES: Table = Table {
    name: "exercises",
    label: "exercise",
    access: Access::Catalog,
    rules: EXERCISE_RULES,
    date_field: None,
    order: &[("name", Direction::Asc)],
    list_window_days: None,
    create_failure: FailureClass::Client,
};

impl Resource for Exercise {
    const TABLE: &'static Table = &EXERCISES;
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::policy::rules::validate;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn workout_requires_exercise_and_date() {
        let errors = validate(WORKOUT_RULES, None, &obj(json!({"sets": 3, "reps": 10})))
            .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["date", "exercise"]);

        let errors = validate(
            WORKOUT_RULES,
            None,
            &obj(json!({"exercise": "  ", "sets": 3, "reps": 10, "date": "2024-01-01"})),
        )
        .unwrap_err();
        assert_eq!(
            errors.get("exercise").unwrap(),
            &["This field may not be blank.".to_string()]
        );
    }

    #[test]
    fn sets_and_reps_must_be_positive() {
        let errors = validate(
            WORKOUT_RULES,
            None,
            &obj(json!({"exercise": "Row", "sets": 0, "reps": -2, "date": "2024-01-01"})),
        )
        .unwrap_err();
        assert_eq!(errors.get("sets").unwrap(), &[AT_LEAST_ONE.to_string()]);
        assert_eq!(errors.get("reps").unwrap(), &[AT_LEAST_ONE.to_string()]);
    }

    #[test]
    fn notes_may_be_null_or_blank() {
        for notes in [Value::Null, json!("")] {
            let payload = obj(json!({
                "exercise": "Row", "sets": 3, "reps": 8, "date": "2024-01-01", "notes": notes
            }));
            let fields = validate(WORKOUT_RULES, None, &payload).expect("valid");
            let workout: Workout = serde_json::from_value(Value::Object(fields)).unwrap();
            assert!(workout.notes.map_or(true, |n| n.is_empty()));
        }
    }

    #[test]
    fn workout_weight_is_two_places() {
        let payload = obj(json!({
            "exercise": "Bench", "sets": 5, "reps": 5, "date": "2024-01-01", "weight": "82.5"
        }));
        let fields = validate(WORKOUT_RULES, None, &payload).expect("valid");
        assert_eq!(fields["weight"], json!(82.5));
    }
}
