use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{error::AppError, utils::envelope::Envelope};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(msg) => Self::NotFound(msg),
            AppError::Validation(msg) => Self::ValidationError(msg),
            AppError::Database(_) | AppError::Join(_) | AppError::InternalError(_) => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError("Internal server error".to_string())
            }
            other => Self::ValidationError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let message = match self {
            Self::InternalError(message) | Self::ValidationError(message) | Self::NotFound(message) => {
                message
            }
        };
        let body = Envelope {
            status: status.as_u16(),
            message,
            data: serde_json::Value::Null,
        };

        (status, Json(body)).into_response()
    }
}
