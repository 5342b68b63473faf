use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{MessageResponse, PublicUser, Registration},
    repo_types::{NewUser, Profile, User, UsernameTaken, PROFILE_RULES, REGISTER_RULES},
};
use crate::{
    auth::{jwt::AuthUser, password::hash_password},
    error::ApiError,
    extract::ApiJson,
    policy::{rules::validate, FieldErrors},
    state::AppState,
};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route(
            "/users/profile",
            get(get_profile).put(update_profile).patch(update_profile),
        )
}

fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// The raw password, or the message explaining why it cannot be used.
fn check_password(raw: Option<&Value>) -> Result<String, String> {
    match raw {
        None => Err("This field is required.".into()),
        Some(Value::Null) => Err("This field may not be null.".into()),
        Some(Value::String(s)) if s.is_empty() => Err("This field may not be blank.".into()),
        Some(Value::String(s)) if s.chars().count() < 8 => Err(
            "This password is too short. It must contain at least 8 characters.".into(),
        ),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err("Not a valid string.".into()),
    }
}

/// Validate a registration payload, collecting every field error.
pub(crate) fn validate_registration(
    payload: &Map<String, Value>,
) -> Result<(Registration, String), FieldErrors> {
    let mut errors = FieldErrors::default();

    let fields = match validate(REGISTER_RULES, None, payload) {
        Ok(fields) => Some(fields),
        Err(e) => {
            errors.merge(e);
            None
        }
    };
    if let Some(username) = payload.get("username").and_then(Value::as_str) {
        if errors.get("username").is_none() && !is_valid_username(username.trim()) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
    }
    let password = match check_password(payload.get("password")) {
        Ok(p) => Some(p),
        Err(msg) => {
            errors.add("password", msg);
            None
        }
    };

    match (fields, password) {
        (Some(fields), Some(password)) if errors.is_empty() => {
            let registration = serde_json::from_value(Value::Object(fields))
                .map_err(|e| {
                    let mut errors = FieldErrors::default();
                    errors.add("non_field_errors", e.to_string());
                    errors
                })?;
            Ok((registration, password))
        }
        _ => Err(errors),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let (registration, password) = validate_registration(&payload).map_err(|e| {
        warn!(fields = %e, "registration rejected");
        ApiError::Validation(e)
    })?;

    if state
        .users
        .find_by_username(&registration.username)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        warn!(username = %registration.username, "username already registered");
        return Err(ApiError::field("username", USERNAME_TAKEN));
    }

    let password_hash = hash_password(&password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::internal(e)
    })?;

    let new = NewUser {
        username: registration.username,
        password_hash,
        profile: Profile {
            email: registration.email,
            first_name: registration.first_name,
            last_name: registration.last_name,
            ..Profile::default()
        },
    };
    let user = match state.users.create(new).await {
        Ok(u) => u,
        Err(e) if e.is::<UsernameTaken>() => {
            return Err(ApiError::field("username", USERNAME_TAKEN));
        }
        Err(e) => return Err(ApiError::internal(e)),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn load_user(state: &AppState, user_id: uuid::Uuid) -> Result<User, ApiError> {
    state
        .users
        .find_by_id(user_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| {
            warn!(user_id = %user_id, "token for unknown user");
            ApiError::Unauthorized("User not found".into())
        })
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(load_user(&state, user_id).await?.into()))
}

/// Merge-update of the caller's profile. Username and password are not
/// writable here.
#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = load_user(&state, user_id).await?;

    let base = match serde_json::to_value(&user.profile).map_err(|e| ApiError::internal(e.into()))? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let fields = validate(PROFILE_RULES, Some(&base), &payload)?;
    let profile: Profile =
        serde_json::from_value(Value::Object(fields)).map_err(|e| ApiError::internal(e.into()))?;

    let updated = state
        .users
        .update_profile(user_id, &profile)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "profile update failed");
            ApiError::BadRequest("An error occurred while updating the profile".into())
        })?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(updated.into()))
}

/// Tokens are stateless; logging out only acknowledges the request.
#[instrument]
pub async fn logout(AuthUser(user_id): AuthUser) -> Json<MessageResponse> {
    info!(user_id = %user_id, "user logged out");
    Json(MessageResponse {
        message: "Successfully logged out.",
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn registration_collects_every_error() {
        let errors = validate_registration(&obj(json!({
            "username": "bad name!",
            "email": "nope",
            "password": "short"
        })))
        .unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["email", "password", "username"]
        );
    }

    #[test]
    fn registration_requires_core_fields() {
        let errors = validate_registration(&Map::new()).unwrap_err();
        for field in ["email", "password", "username"] {
            assert_eq!(
                errors.get(field).unwrap(),
                &["This field is required.".to_string()],
                "{field}"
            );
        }
    }

    #[test]
    fn valid_registration() {
        let (reg, password) = validate_registration(&obj(json!({
            "username": "jane.doe+fit@home",
            "email": "jane@example.com",
            "password": "long-enough",
            "first_name": "Jane"
        })))
        .expect("valid");
        assert_eq!(reg.username, "jane.doe+fit@home");
        assert_eq!(reg.first_name, "Jane");
        assert_eq!(reg.last_name, "");
        assert_eq!(password, "long-enough");
    }

    #[test]
    fn password_is_not_trimmed() {
        assert_eq!(check_password(Some(&json!("  spaced  "))).unwrap(), "  spaced  ");
        assert!(check_password(Some(&json!(12345678))).is_err());
    }
}
