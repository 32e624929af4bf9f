use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use feedback::payloads::ErrorBody;
use thiserror::Error;
use tracing::error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Missing required fields: page, comment")]
    MissingFields,

    #[error("Missing id parameter")]
    MissingId,

    #[error("Feedback not found")]
    NotFound,

    #[error("General feedback storage not configured")]
    Unsupported,

    #[error("{context}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MalformedPayload | AppError::MissingFields | AppError::MissingId => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unsupported => StatusCode::NOT_IMPLEMENTED,
            AppError::Storage { context, source } => {
                error!("{context}: {source}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Attaches the client facing message to a storage failure.
pub trait StorageContext<T> {
    fn or_fail(self, context: &'static str) -> Result<T, AppError>;
}

impl<T> StorageContext<T> for Result<T, StorageError> {
    fn or_fail(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|source| match source {
            StorageError::Unsupported => AppError::Unsupported,
            source => AppError::Storage { context, source },
        })
    }
}
