use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use tracing::debug;

use crate::error::ApiError;

/// `Json<T>` whose rejection is a `400 {"detail"}` instead of axum's plain
/// text 415/422.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!(error = %rejection, "rejected request body");
                Err(ApiError::BadRequest(format!(
                    "JSON parse error - {}",
                    rejection.body_text()
                )))
            }
        }
    }
}
