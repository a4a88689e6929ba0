//! Session manager: login, logout, refresh and startup restoration.
//!
//! The manager is the only writer of the credential store. Every operation
//! leaves the stored tokens and the in-memory `SessionState` consistent.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::api::client::join_url;
use crate::models::{Transactions, User};

use super::{AuthError, CredentialStore, SessionAuthenticator, SessionState, TokenKey};

const LOGIN_PATH: &str = "/loginDash";
const VERIFY_PATH: &str = "/auth/verify";
const LOGOUT_PATH: &str = "/auth/logout";
const FORGOT_PASSWORD_PATH: &str = "/forgot-password";

type RefreshFlight = Shared<BoxFuture<'static, Result<User, AuthError>>>;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    loggedinuser: User,
}

#[derive(Serialize)]
struct RefreshTokenRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    user: User,
    #[serde(default)]
    transactions: Option<Transactions>,
    /// Present only when the server rotated the access token
    #[serde(default)]
    new_acces_token: Option<String>,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Handle to the session. Clone is cheap; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
    refresh_flight: Mutex<Option<RefreshFlight>>,
}

impl SessionManager {
    /// Create a manager over `store`. The session starts empty; it is marked
    /// loading when a persisted access token is waiting to be restored.
    pub fn new(client: Client, base_url: &str, store: Arc<dyn CredentialStore>) -> Self {
        let has_saved_session = matches!(store.get(TokenKey::Access), Ok(Some(_)));
        let (state, _) = watch::channel(SessionState {
            is_loading: has_saved_session,
            ..SessionState::default()
        });

        Self {
            inner: Arc::new(Inner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                store,
                state,
                refresh_flight: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the current session state
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every session transition
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.inner.base_url, path)
    }

    fn read_token(&self, key: TokenKey) -> Option<String> {
        match self.inner.store.get(key) {
            Ok(token) => token,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Failed to read stored token");
                None
            }
        }
    }

    fn set_loading(&self, loading: bool) {
        self.inner.state.send_modify(|s| s.is_loading = loading);
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Exchange email and password for a session.
    ///
    /// On failure nothing is persisted and the error is returned for display;
    /// the error payload itself is never logged.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.set_loading(true);
        let result = self.login_inner(email, password).await;
        self.set_loading(false);
        result
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let response = self
            .inner
            .client
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Login rejected");
            if status == StatusCode::UNAUTHORIZED {
                return Err(AuthError::InvalidCredentials);
            }
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::from_status(status, &body));
        }

        let data: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("login response: {}", e)))?;

        let persisted = self
            .inner
            .store
            .set(TokenKey::Access, &data.access_token)
            .and_then(|_| self.inner.store.set(TokenKey::Refresh, &data.refresh_token));
        if let Err(e) = persisted {
            if let Err(clear_err) = self.inner.store.clear() {
                warn!(error = %clear_err, "Failed to roll back partially stored tokens");
            }
            return Err(AuthError::storage(e));
        }

        let user = data.loggedinuser;
        self.inner.state.send_modify(|s| {
            s.user = Some(user.clone());
            s.transactions = None;
        });
        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// End the session. The server is told to invalidate the refresh token
    /// when there is one; local state is cleared whatever the server says.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.read_token(TokenKey::Refresh) {
            let result = self
                .inner
                .client
                .post(self.url(LOGOUT_PATH))
                .json(&RefreshTokenRequest {
                    refresh_token: &refresh_token,
                })
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    debug!("Server acknowledged logout");
                }
                Ok(response) => {
                    debug!(status = response.status().as_u16(), "Server rejected logout");
                }
                Err(e) => {
                    debug!(error = %e, "Server logout request failed");
                }
            }
        }

        self.clear_local();
        info!("Logged out");
    }

    fn clear_local(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
        self.inner.state.send_modify(SessionState::signed_out);
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Verify the session with the server, rotating the access token when
    /// the server issues a new one.
    ///
    /// Concurrent callers share one in-flight call and its outcome. On
    /// failure the session has been logged out before the error is returned.
    pub async fn refresh(&self) -> Result<User, AuthError> {
        let flight = {
            let mut slot = self.inner.refresh_flight.lock().await;
            match slot.as_ref() {
                Some(flight) => {
                    debug!("Joining in-flight session refresh");
                    flight.clone()
                }
                None => {
                    let flight = Self::start_refresh(Arc::downgrade(&self.inner));
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await
    }

    fn start_refresh(inner: Weak<Inner>) -> RefreshFlight {
        async move {
            let Some(inner) = inner.upgrade() else {
                return Err(AuthError::MissingTokens);
            };
            let manager = SessionManager { inner };
            let result = manager.refresh_once().await;
            manager.inner.refresh_flight.lock().await.take();
            result
        }
        .boxed()
        .shared()
    }

    async fn refresh_once(&self) -> Result<User, AuthError> {
        let access = self.read_token(TokenKey::Access);
        let refresh = self.read_token(TokenKey::Refresh);
        let (Some(access), Some(refresh)) = (access, refresh) else {
            warn!("Session refresh requested without stored tokens");
            self.logout().await;
            return Err(AuthError::MissingTokens);
        };

        // A logout or a new login that finishes while we wait owns the store
        // from then on: this flight must neither write nor log out.
        let verified = match self.verify(&access, &refresh).await {
            Ok(verified) => verified,
            Err(_) if self.is_superseded(&refresh) => {
                debug!("Ignoring refresh failure for a superseded session");
                return Err(AuthError::Superseded);
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                self.logout().await;
                return Err(e);
            }
        };

        if self.is_superseded(&refresh) {
            debug!("Discarding refresh result for a superseded session");
            return Err(AuthError::Superseded);
        }

        if let Some(new_token) = verified.new_acces_token.as_deref() {
            if let Err(e) = self.inner.store.set(TokenKey::Access, new_token) {
                if self.is_superseded(&refresh) {
                    return Err(AuthError::Superseded);
                }
                warn!(error = %e, "Failed to store rotated access token");
                self.logout().await;
                return Err(AuthError::storage(e));
            }
            debug!("Access token rotated");
        }

        let user = verified.user;
        self.inner.state.send_modify(|s| {
            s.user = Some(user.clone());
            s.transactions = verified.transactions;
        });
        debug!(user_id = %user.id, "Session verified");
        Ok(user)
    }

    /// Whether the stored refresh token is no longer the one `refresh` was
    /// started with
    fn is_superseded(&self, refresh: &str) -> bool {
        self.read_token(TokenKey::Refresh).as_deref() != Some(refresh)
    }

    async fn verify(&self, access: &str, refresh: &str) -> Result<VerifyResponse, AuthError> {
        let response = self
            .inner
            .client
            .post(self.url(VERIFY_PATH))
            .header(header::AUTHORIZATION, format!("Bearer {}", access))
            .json(&RefreshTokenRequest {
                refresh_token: refresh,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::from_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("verify response: {}", e)))
    }

    // =========================================================================
    // Startup & password reset
    // =========================================================================

    /// Restore a persisted session at startup.
    ///
    /// Loading stays set until the refresh resolves. Returns whether the
    /// session is authenticated afterwards.
    pub async fn restore(&self) -> bool {
        if self.read_token(TokenKey::Access).is_none() {
            self.set_loading(false);
            return false;
        }

        self.set_loading(true);
        let restored = match self.refresh().await {
            Ok(user) => {
                info!(user_id = %user.id, "Session restored");
                true
            }
            Err(e) => {
                info!(error = %e, "Saved session could not be restored");
                false
            }
        };
        self.set_loading(false);
        restored
    }

    /// Ask the server to send a password reset email. Returns the server's
    /// informational message, if any.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, AuthError> {
        let response = self
            .inner
            .client
            .post(self.url(FORGOT_PASSWORD_PATH))
            .json(&ForgotPasswordRequest { email })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::from_status(status, &body));
        }

        let body: MessageResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("forgot-password response: {}", e)))?;
        Ok(body.message)
    }
}

#[async_trait]
impl SessionAuthenticator for SessionManager {
    async fn refresh(&self) -> Result<(), AuthError> {
        SessionManager::refresh(self).await.map(|_| ())
    }

    async fn logout(&self) {
        SessionManager::logout(self).await
    }
}
