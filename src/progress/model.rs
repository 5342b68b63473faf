use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    policy::{Access, Direction, FailureClass, FieldRule, Table},
    resources::Resource,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub date: Date,
    pub weight: Option<f64>,
    pub calories_consumed: Option<i32>,
    pub workouts_completed: Option<i32>,
}

const PROGRESS_RULES: &[FieldRule] = &[
    FieldRule::date("date"),
    FieldRule::number("weight").optional(),
    FieldRule::integer("calories_consumed").optional(),
    FieldRule::integer("workouts_completed").optional(),
];

// Oldest first, for charting.
const PROGRESS_ENTRIES: Table = Table {
    name: "progress_entries",
    label: "progress entry",
    access: Access::Owned,
    rules: PROGRESS_RULES,
    date_field: Some("date"),
    order: &[("date", Direction::Asc)],
    list_window_days: None,
    create_failure: FailureClass::Client,
};

impl Resource for ProgressEntry {
    const TABLE: &'static Table = &PROGRESS_ENTRIES;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurement {
    pub date: Date,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub biceps: Option<f64>,
    pub thighs: Option<f64>,
}

const MEASUREMENT_RULES: &[FieldRule] = &[
    FieldRule::date("date"),
    FieldRule::number("chest").optional(),
    FieldRule::number("waist").optional(),
    FieldRule::number("hips").optional(),
    FieldRule::number("biceps").optional(),
    FieldRule::number("thighs").optional(),
];

const BODY_MEASUREMENTS: Table = Table {
    name: "body_measurements",
    label: "body measurement",
    access: Access::Owned,
    rules: MEASUREMENT_RULES,
    date_field: Some("date"),
    order: &[("date", Direction::Asc)],
    list_window_days: None,
    create_failure: FailureClass::Client,
};

impl Resource for BodyMeasurement {
    const TABLE: &'static Table = &BODY_MEASUREMENTS;
}
