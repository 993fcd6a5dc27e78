use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Carrier rejected credentials: {0}")]
    Unauthorized(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Interactive login timed out after {0} seconds")]
    LoginTimeout(u64),

    #[error("No auth token found after login: {0}")]
    TokenExtraction(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthorized,
    LoginFailed,
    LoginTimeout,
    TokenExtraction,
    Cancelled,
    Timeout,
    Transport,
    ParseError,
    Browser,
    Io,
    Unknown,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    fn to_error_code(&self) -> ErrorCode {
        match self {
            ApiError::Unauthorized(_) => ErrorCode::Unauthorized,
            ApiError::LoginFailed(_) => ErrorCode::LoginFailed,
            ApiError::LoginTimeout(_) => ErrorCode::LoginTimeout,
            ApiError::TokenExtraction(_) => ErrorCode::TokenExtraction,
            ApiError::Cancelled(_) => ErrorCode::Cancelled,
            ApiError::Timeout(_) => ErrorCode::Timeout,
            ApiError::Transport(_) => ErrorCode::Transport,
            ApiError::ParseError(_) => ErrorCode::ParseError,
            ApiError::Browser(_) => ErrorCode::Browser,
            ApiError::Io(_) => ErrorCode::Io,
            ApiError::Unknown(_) => ErrorCode::Unknown,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::LoginFailed(_) => StatusCode::UNAUTHORIZED,
            ApiError::LoginTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::TokenExtraction(_) => StatusCode::BAD_GATEWAY,
            // 499 has no named constant.
            ApiError::Cancelled(_) => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT)
            }
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Transport(_) => StatusCode::BAD_GATEWAY,
            ApiError::ParseError(_) => StatusCode::BAD_GATEWAY,
            ApiError::Browser(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for rejections that a fresh login can fix.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.to_error_code(),
                message: self.to_string(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<chromiumoxide::error::CdpError> for ApiError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ApiError::Browser(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}
