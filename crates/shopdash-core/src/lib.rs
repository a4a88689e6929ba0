//! Shopdash core - session management and the authenticated API client for
//! the shop admin dashboard.
//!
//! The `SessionManager` owns the tokens and the signed-in user; the
//! `ApiClient` routes every call through it for credential attachment,
//! refresh-and-retry and forced logout. `connect` wires the two together.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod notice;

use std::sync::Arc;

use anyhow::Result;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, SessionManager, SessionState};
pub use config::Config;

/// Build the session manager and the API client that calls back into it.
pub fn connect(config: &Config) -> Result<(SessionManager, ApiClient)> {
    let store = config.credential_store()?;
    let http = api::client::build_http_client(config.request_timeout())?;
    let base_url = config.api_base_url();

    let session = SessionManager::new(http.clone(), &base_url, store.clone());
    let api = ApiClient::new(http, &base_url, store, Arc::new(session.clone()));
    Ok((session, api))
}
