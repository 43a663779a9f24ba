//! Verification error types.

use mensa_core::error::MensaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// A verification is already in flight (or its result is still on
    /// screen) on this scanning surface.
    #[error("scan session is busy")]
    Busy,

    #[error("invalid scan token: {0}")]
    InvalidToken(String),
}

impl From<VerifyError> for MensaError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Busy => MensaError::Internal("scan session is busy".into()),
            VerifyError::InvalidToken(msg) => MensaError::Validation {
                message: format!("invalid scan token: {msg}"),
            },
        }
    }
}
