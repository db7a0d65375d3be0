use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use ovation_core::EngineError;

/// Engine failures carried to the HTTP edge. Every variant maps to a
/// specific, actionable response; conflicting seat ids travel in the body.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            EngineError::SeatsUnavailable { conflicting } => (
                StatusCode::CONFLICT,
                json!({
                    "error": self.0.to_string(),
                    "conflicting_seats": conflicting,
                }),
            ),
            EngineError::UnknownSeat(_) | EngineError::BookingNotFound(_) => {
                (StatusCode::NOT_FOUND, json!({ "error": self.0.to_string() }))
            }
            EngineError::InvalidTransition { .. } | EngineError::DuplicateTicket { .. } => {
                (StatusCode::CONFLICT, json!({ "error": self.0.to_string() }))
            }
            EngineError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.0.to_string() }),
            ),
            EngineError::StorageUnavailable(msg) => {
                tracing::error!("storage unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "storage unavailable" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
