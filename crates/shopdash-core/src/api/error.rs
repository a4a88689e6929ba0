use thiserror::Error;

use crate::auth::AuthError;

/// Shown when the server refuses a request for lack of admin rights
pub const ADMIN_REQUIRED_MESSAGE: &str =
    "Admin access required. You need to be an administrator to perform this action.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - session could not be renewed")]
    Unauthorized,

    #[error("Session expired: {0}")]
    SessionExpired(#[source] AuthError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Whether this error ended the session, sending the user back to login
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            ApiError::AccessDenied(_) | ApiError::Unauthorized | ApiError::SessionExpired(_)
        )
    }

    /// Message suitable for showing to the dashboard user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AccessDenied(_) => ADMIN_REQUIRED_MESSAGE.to_string(),
            ApiError::Unauthorized | ApiError::SessionExpired(_) => {
                "Your session has ended. Please log in again.".to_string()
            }
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            other => other.to_string(),
        }
    }
}
