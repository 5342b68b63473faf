use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    policy::{Access, Direction, FailureClass, Fallback, FieldRule, Table},
    resources::Resource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Weight,
    Workout,
    Nutrition,
    Measurement,
}

/// Set directly by the client; any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub target: f64,
    pub current: f64,
    pub unit: String,
    pub start_date: Date,
    pub end_date: Date,
    pub status: GoalStatus,
}

const RULES: &[FieldRule] = &[
    FieldRule::text("title", 200),
    FieldRule::long_text("description").blank(),
    FieldRule::choice("category", &["weight", "workout", "nutrition", "measurement"]),
    FieldRule::number("target").positive("Target value must be greater than 0"),
    FieldRule::number("current")
        .non_negative("Current value cannot be negative")
        .or(Fallback::Zero),
    FieldRule::text("unit", 50),
    FieldRule::date("start_date"),
    FieldRule::date("end_date"),
    FieldRule::choice("status", &["not_started", "in_progress", "completed", "failed"])
        .or(Fallback::Text("not_started")),
];

const GOALS: Table = Table {
    name: "goals",
    label: "goal",
    access: Access::Owned,
    rules: RULES,
    date_field: None,
    order: &[("created_at", Direction::Desc)],
    list_window_days: None,
    create_failure: FailureClass::Client,
};

impl Resource for Goal {
    const TABLE: &'static Table = &GOALS;
}
