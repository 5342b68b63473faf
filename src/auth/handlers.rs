use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{RefreshRequest, TokenPair, TokenRequest, VerifyRequest},
        jwt::JwtKeys,
        password::verify_password,
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";
const BAD_TOKEN: &str = "Token is invalid or expired";

pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(obtain_pair))
        .route("/token/refresh", post(refresh))
        .route("/token/verify", post(verify))
}

fn issue_pair(keys: &JwtKeys, user_id: Uuid) -> Result<TokenPair, ApiError> {
    let access = keys.sign_access(user_id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        ApiError::internal(e)
    })?;
    let refresh = keys.sign_refresh(user_id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        ApiError::internal(e)
    })?;
    Ok(TokenPair { access, refresh })
}

#[instrument(skip(state, payload))]
pub async fn obtain_pair(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let username = payload.username.trim();
    let user = match state.users.find_by_username(username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %username, "login unknown username");
            return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_username failed");
            return Err(ApiError::internal(e));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        ApiError::internal(e)
    })?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let pair = issue_pair(&keys, user.id)?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(pair))
}

/// Exchange a refresh token for a new pair. The old refresh token stays
/// valid until it expires.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthorized(BAD_TOKEN.into())
    })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let pair = issue_pair(&keys, user.id)?;
    info!(user_id = %user.id, "tokens refreshed");
    Ok(Json(pair))
}

#[instrument(skip(state, payload))]
pub async fn verify(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    keys.verify(&payload.token).map_err(|e| {
        warn!(error = %e, "token verify rejected");
        ApiError::Unauthorized(BAD_TOKEN.into())
    })?;
    Ok(Json(json!({})))
}
