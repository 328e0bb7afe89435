use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::api::ApiResponse;

use crate::roadmap::RoadmapError;

#[derive(Debug)]
pub enum AppError {
    /// Internal errors - logged but return a generic failure envelope
    Internal(anyhow::Error),
    /// User-facing errors - message is safe to show
    External(StatusCode, &'static str),
    /// Validation errors - safe to show
    Validation(String),
}

impl AppError {
    /// Maps ledger failures onto HTTP statuses. The messages pass through
    /// unchanged; they are part of the wire contract.
    pub fn domain(err: RoadmapError) -> Self {
        match err {
            RoadmapError::MissingFields
            | RoadmapError::TitleTooLong
            | RoadmapError::DescriptionTooLong => AppError::Validation(err.to_string()),
            RoadmapError::SubmitCooldown => AppError::External(
                StatusCode::TOO_MANY_REQUESTS,
                "Please wait before submitting another feature",
            ),
            RoadmapError::AlreadyVoted => AppError::External(
                StatusCode::CONFLICT,
                "You already voted for this feature",
            ),
            RoadmapError::NotVoted => AppError::External(
                StatusCode::CONFLICT,
                "You have not voted for this feature",
            ),
            RoadmapError::FeatureNotFound => {
                AppError::External(StatusCode::NOT_FOUND, "Feature not found")
            }
            RoadmapError::Store(err) => AppError::Internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(err) => {
                tracing::error!("internal error: {:?}", err);
                sentry::capture_error(
                    err.as_ref() as &(dyn std::error::Error + Send + Sync + 'static)
                );

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred. Please try again.".to_string(),
                )
            }
            AppError::External(status, msg) => (status, msg.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}
