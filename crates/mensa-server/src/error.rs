//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mensa_core::error::MensaError;
use mensa_verify::VerifyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Mensa(#[from] MensaError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Mensa(MensaError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Mensa(MensaError::AlreadyExists { .. }) => StatusCode::CONFLICT,
            AppError::Mensa(MensaError::Validation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Verify(VerifyError::Busy) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Verify(VerifyError::InvalidToken(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
