// HTTP error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use livegate_core::auth::AuthError;
use livegate_core::relay::RelayError;
use livegate_core::room_keys::RoomKeyError;
use livegate_core::stats::StatsError;
use std::fmt;

use super::response::ApiResponse;

/// Result type for HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

/// Handler failure rendered as the response envelope with `data` set to the
/// message
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiResponse::new(self.status, self.message).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidApiKey => Self::unauthorized(err.to_string()),
            AuthError::Token(msg) => Self::forbidden(msg),
            AuthError::UnsupportedAlgorithm(_) => {
                tracing::error!("JWT misconfigured: {}", err);
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::SessionNotFound(_) => Self::not_found(err.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::RoomNotFound(_) => Self::not_found(err.to_string()),
            StatsError::ProviderUnavailable
            | StatsError::NoReader(_)
            | StatsError::NotInstrumented(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<RoomKeyError> for AppError {
    fn from(err: RoomKeyError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<livegate_core::Error> for AppError {
    fn from(err: livegate_core::Error) -> Self {
        use livegate_core::Error;

        match err {
            Error::Auth(e) => e.into(),
            Error::Relay(e) => e.into(),
            Error::Stats(e) => e.into(),
            Error::RoomKey(e) => e.into(),
            Error::InvalidInput(msg) => Self::bad_request(msg),
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                Self::internal("Internal server error")
            }
            Error::Io(e) => {
                tracing::error!("IO error: {}", e);
                Self::internal("Internal server error")
            }
        }
    }
}
