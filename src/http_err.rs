use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// The error envelope returned by every failing endpoint: a `status`
/// discriminator plus stable, store-agnostic messages.
#[derive(Serialize)]
pub struct ErrorRep {
    pub status: &'static str,
    pub errors: Vec<String>,
}

impl ErrorRep {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            errors: vec![message.into()],
        }
    }
}

pub enum ApiError {
    BadRequestReason(String),
    Unauthorized,
    NotFoundReason(String),
    ConflictReason(String),
    UnprocessableReason(String),
    InternalServerError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, rep) = match self {
            Self::BadRequestReason(reason) => (StatusCode::BAD_REQUEST, ErrorRep::new(reason)),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorRep::new("A valid 'X-User-Id' header is required."),
            ),
            Self::NotFoundReason(reason) => (StatusCode::NOT_FOUND, ErrorRep::new(reason)),
            Self::ConflictReason(reason) => (StatusCode::CONFLICT, ErrorRep::new(reason)),
            Self::UnprocessableReason(reason) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorRep::new(reason))
            }
            Self::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorRep::new("Internal server error."),
            ),
        };

        (status, Json(rep)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        error!(?error, "Received error.");

        Self::InternalServerError
    }
}

pub type ApiResponse<T> = Result<T, ApiError>;
