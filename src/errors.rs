use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

/// Failures of the lifecycle and matching core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("no eligible assistant at station {0}")]
    NoEligibleAssistant(String),

    #[error("booking {0} was modified concurrently")]
    ConcurrentModification(String),

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("booking not found: {0}")]
    BookingNotFound(String),

    #[error("booking {0} can only be assigned through matching")]
    AssistantRequired(String),
}

impl AssignmentError {
    pub fn persistence(err: anyhow::Error) -> Self {
        AssignmentError::PersistenceUnavailable(format!("{err:#}"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Assignment(e) => match e {
                AssignmentError::InvalidTransition { .. }
                | AssignmentError::ConcurrentModification(_)
                | AssignmentError::AssistantRequired(_) => StatusCode::CONFLICT,
                AssignmentError::NoEligibleAssistant(_) | AssignmentError::BookingNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                AssignmentError::PersistenceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
