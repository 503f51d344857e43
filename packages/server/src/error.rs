//! HTTP mapping for engine errors.
//!
//! Every user-caused failure keeps its Russian message and a stable
//! machine-readable marker; internal failures are logged and hidden
//! behind a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use receipt_engine::EngineError;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_integration: Option<String>,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            missing_field: None,
            missing_integration: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            EngineError::Refusal(message) => (StatusCode::BAD_REQUEST, ErrorBody::new(message)),
            EngineError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    missing_field: Some(field),
                    ..ErrorBody::new(message)
                },
            ),
            err @ EngineError::ReceiptNotFound { .. } => {
                (StatusCode::NOT_FOUND, ErrorBody::new(err.to_string()))
            }
            err @ EngineError::BulkLimitExceeded { .. } => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(err.to_string()))
            }
            EngineError::MissingConfig(what) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    missing_integration: Some(what.clone()),
                    ..ErrorBody::new(format!("не настроена интеграция: {what}"))
                },
            ),
            err => {
                tracing::error!(error = %err, "internal error while processing receipt");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Внутренняя ошибка сервера. Попробуй ещё раз позже."),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
