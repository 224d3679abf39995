//! Application-wide error types.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bouwdepot_ledger::{TransitionError, UnknownStatus, ValidationError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{}", .0.body_text())]
    BadRequest(#[from] JsonRejection),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("Corrupt row: {0}")]
    CorruptRow(#[from] UnknownStatus),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not signed in")]
    Unauthenticated { login_url: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            // 400 for malformed JSON, 415 for a missing content type, 422
            // when the body does not fit the form.
            Self::BadRequest(rejection) => rejection.status(),
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Transition(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Migrate(_) | Self::Config(_) | Self::CorruptRow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Unauthenticated { login_url } => ErrorResponse {
                error: "Not signed in".to_string(),
                login_url: Some(login_url),
            },
            e if status.is_server_error() => {
                // Storage details stay in the log.
                error!("Request failed: {e}");
                ErrorResponse {
                    error: "Something went wrong, please try again".to_string(),
                    login_url: None,
                }
            }
            e => ErrorResponse {
                error: e.to_string(),
                login_url: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
