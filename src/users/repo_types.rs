use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::policy::FieldRule;

/// Client-editable part of a user row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub gender: String,
    pub fitness_goal: String,
    pub activity_level: String,
    pub medical_conditions: String,
    pub dietary_restrictions: String,
    pub date_of_birth: Option<Date>,
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String, // Argon2 hash, never serialized
    #[sqlx(flatten)]
    pub profile: Profile,
    pub date_joined: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub profile: Profile,
}

/// Returned by a store when the username is already registered.
#[derive(Debug, thiserror::Error)]
#[error("username already taken")]
pub struct UsernameTaken;

pub const REGISTER_RULES: &[FieldRule] = &[
    FieldRule::text("username", 150),
    FieldRule::email("email"),
    FieldRule::text("first_name", 150).blank(),
    FieldRule::text("last_name", 150).blank(),
];

pub const PROFILE_RULES: &[FieldRule] = &[
    FieldRule::email("email").blank(),
    FieldRule::text("first_name", 150).blank(),
    FieldRule::text("last_name", 150).blank(),
    FieldRule::integer("age").optional(),
    FieldRule::number("weight").optional(),
    FieldRule::number("height").optional(),
    FieldRule::text("gender", 10).blank(),
    FieldRule::text("fitness_goal", 100).blank(),
    FieldRule::text("activity_level", 50).blank(),
    FieldRule::long_text("medical_conditions").blank(),
    FieldRule::long_text("dietary_restrictions").blank(),
    FieldRule::date("date_of_birth").optional(),
];
