use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::pipeline::filter::CompileError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event filter {0}")]
    Filter(#[from] CompileError),

    #[error("Invalid system identity: {0}")]
    Identity(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Producer error: {0}")]
    Producer(String),

    #[error("Event name not found in request")]
    EventNameNotFound,

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for AppError {
    fn from(err: ::config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) | AppError::Filter(_) | AppError::SecretNotFound(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::EventNameNotFound => StatusCode::BAD_REQUEST,
            AppError::Identity(_)
            | AppError::Render(_)
            | AppError::Producer(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
