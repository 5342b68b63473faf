use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    policy::{Access, Direction, FailureClass, FieldRule, Table},
    resources::Resource,
};

/// Shared food catalog entry. Not owned by any user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub name: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: String,
}

const FOOD_RULES: &[FieldRule] = &[
    FieldRule::text("name", 200),
    FieldRule::integer("calories").non_negative("calories cannot be negative"),
    FieldRule::number("protein").non_negative("protein cannot be negative"),
    FieldRule::number("carbs").non_negative("carbs cannot be negative"),
    FieldRule::number("fats").non_negative("fats cannot be negative"),
    FieldRule::text("serving_size", 100),
];

const FOODS: Table = Table {
    name: "foods",
    label: "food",
    access: Access::Catalog,
    rules: FOOD_RULES,
    date_field: None,
    order: &[("name", Direction::Asc)],
    list_window_days: None,
    create_failure: FailureClass::Client,
};

impl Resource for Food {
    const TABLE: &'static Table = &FOODS;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    /// Free-text food name, not a catalog reference.
    pub food: String,
    pub calories: i32,
    pub meal_type: MealType,
    pub date: Date,
    pub notes: String,
}

const MEAL_RULES: &[FieldRule] = &[
    FieldRule::text("food", 200),
    FieldRule::integer("calories").positive("Calories must be greater than 0"),
    FieldRule::choice("meal_type", &["Breakfast", "Lunch", "Dinner", "Snack"]),
    FieldRule::date("date"),
    FieldRule::long_text("notes").blank(),
];

const MEALS: Table = Table {
    name: "meals",
    label: "meal",
    access: Access::Owned,
    rules: MEAL_RULES,
    date_field: Some("date"),
    order: &[("date", Direction::Desc), ("created_at", Direction::Desc)],
    list_window_days: None,
    create_failure: FailureClass::Client,
};

impl Resource for Meal {
    const TABLE: &'static Table = &MEALS;
}
