//! The HTTP binding of the general ledger engine.

pub mod handlers;
pub mod reps;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::http_err::ApiError;

/// The identity of the calling user, taken from the `X-User-Id` header.
/// Authentication itself is handled upstream of this service.
pub struct UserId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self(user_id))
    }
}
