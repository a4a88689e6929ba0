use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::api::error::truncate_body;

/// Failures of the session operations (login, refresh, forgot-password).
///
/// `Clone` so a single refresh outcome can be handed to every request that
/// was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No stored session tokens")]
    MissingTokens,

    #[error("Session changed while refreshing")]
    Superseded,

    #[error("Authentication rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[source] Arc<reqwest::Error>),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage failed: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(Arc::new(e))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl AuthError {
    /// Build an error for a non-2xx auth endpoint response, preferring the
    /// server's `message` field over the raw body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| truncate_body(body));
        AuthError::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    pub fn storage(e: anyhow::Error) -> Self {
        AuthError::Storage(format!("{:#}", e))
    }

    /// Message suitable for the login screen
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            AuthError::Network(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            AuthError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => "Your session has ended. Please log in again.".to_string(),
        }
    }
}
