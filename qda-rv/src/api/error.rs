//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors returned by report handlers
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Project data cannot be turned into a report (e.g. cyclic categories)
    Unprocessable(String),
    Internal(String),
}

impl From<qda_common::Error> for ApiError {
    fn from(e: qda_common::Error) -> Self {
        use qda_common::Error;
        match e {
            Error::InvalidInput(_) => ApiError::BadRequest(e.to_string()),
            Error::NotFound(_) => ApiError::NotFound(e.to_string()),
            Error::MalformedHierarchy { .. }
            | Error::MissingDocument { .. }
            | Error::IntervalOutOfBounds { .. } => ApiError::Unprocessable(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Report task failed: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal(msg) => {
                error!("Report request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
