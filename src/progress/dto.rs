use serde::Serialize;
use time::Date;

use super::model::{BodyMeasurement, ProgressEntry};

#[derive(Debug, Serialize)]
pub struct WeightPoint {
    pub date: Date,
    pub weight: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct NutritionPoint {
    pub date: Date,
    pub calories_consumed: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutPoint {
    pub date: Date,
    pub workouts_completed: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct MeasurementPoint {
    pub date: Date,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub biceps: Option<f64>,
    pub thighs: Option<f64>,
}

impl From<ProgressEntry> for WeightPoint {
    fn from(e: ProgressEntry) -> Self {
        Self {
            date: e.date,
            weight: e.weight,
        }
    }
}

impl From<ProgressEntry> for NutritionPoint {
    fn from(e: ProgressEntry) -> Self {
        Self {
            date: e.date,
            calories_consumed: e.calories_consumed,
        }
    }
}

impl From<ProgressEntry> for WorkoutPoint {
    fn from(e: ProgressEntry) -> Self {
        Self {
            date: e.date,
            workouts_completed: e.workouts_completed,
        }
    }
}

impl From<BodyMeasurement> for MeasurementPoint {
    fn from(m: BodyMeasurement) -> Self {
        Self {
            date: m.date,
            chest: m.chest,
            waist: m.waist,
            hips: m.hips,
            biceps: m.biceps,
            thighs: m.thighs,
        }
    }
}
