use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("no file")]
    MissingFile,

    #[error("invalid filename")]
    InvalidFilename(#[source] anyhow::Error),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Storage failure: {0}")]
    Storage(anyhow::Error),
}

impl AppError {
    /// Body-limit violations surface as multipart errors carrying a 413;
    /// everything else is a malformed request.
    pub fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(err.body_text())
        }
    }

    /// A body limit hit while streaming to disk is still the client's fault.
    pub fn from_storage(err: anyhow::Error) -> Self {
        match body_limit_cause(&err) {
            Some(multipart) => AppError::PayloadTooLarge(multipart.body_text()),
            None => AppError::Storage(err),
        }
    }
}

/// The field stream reaches storage wrapped in an `io::Error`, so the
/// multipart error sits inside it rather than in the anyhow chain proper.
fn body_limit_cause(err: &anyhow::Error) -> Option<&MultipartError> {
    err.chain()
        .find_map(|cause| {
            cause.downcast_ref::<MultipartError>().or_else(|| {
                cause
                    .downcast_ref::<io::Error>()
                    .and_then(|io_err| io_err.get_ref())
                    .and_then(|inner| inner.downcast_ref::<MultipartError>())
            })
        })
        .filter(|multipart| multipart.status() == StatusCode::PAYLOAD_TOO_LARGE)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingFile => (StatusCode::BAD_REQUEST, "no file".to_string()),
            AppError::InvalidFilename(e) => {
                tracing::warn!("Rejected upload filename: {}", e);
                (StatusCode::BAD_REQUEST, "invalid filename".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Storage(e) => {
                tracing::error!("Storage failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to save upload".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
