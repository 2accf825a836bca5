pub mod draft;
pub mod network;

use axum::http::StatusCode;

pub use draft::{Draft, FieldErrors};

/// Everything the submit endpoint can answer with besides success.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("GitHub configuration not found")]
    Configuration,

    #[error("Missing filename or content")]
    MissingField,

    #[error("Invalid request body: {0}")]
    InvalidJson(String),

    #[error("GitHub API error: {status_text}")]
    Provider {
        status: StatusCode,
        status_text: String,
        body: String,
    },

    #[error("{0}")]
    Network(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Configuration | ApiError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingField | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider { status, .. } => *status,
        }
    }
}
