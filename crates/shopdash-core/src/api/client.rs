//! Authenticated request pipeline for the shop API.
//!
//! Every dashboard call goes through `ApiClient::execute`, which owns the
//! credential protocol so the endpoint functions stay plain request/response
//! mappings.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::{CredentialStore, SessionAuthenticator, TokenKey};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// Timeouts surface as network errors, never as authorization failures.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Join the API base URL and an endpoint path with exactly one slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Build the shared HTTP client. Clone is cheap - reqwest::Client uses Arc
/// internally for connection pooling.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Backoff applied to 429 responses before giving up with `RateLimited`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RATE_LIMIT_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }
}

/// An outbound call with everything needed to replay it once after a
/// session refresh.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    retried: bool,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", self.path, e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Whether this request has already been replayed after a refresh
    pub fn retried(&self) -> bool {
        self.retried
    }
}

/// API client for the shop backend.
/// Clone is cheap; clones share the connection pool, store and session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    auth: Arc<dyn SessionAuthenticator>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client. `auth` is called back on 401 (refresh) and 403 (logout).
    pub fn new(
        client: Client,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        auth: Arc<dyn SessionAuthenticator>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            auth,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access token as currently stored; storage errors count as "no token"
    fn current_token(&self) -> Option<String> {
        match self.store.get(TokenKey::Access) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read access token, sending without credentials");
                None
            }
        }
    }

    fn auth_headers(token: Option<&str>) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("access token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Send one attempt of `request` with the current token attached.
    /// 429 responses are retried with exponential backoff here.
    /// Returns the response together with the token it was sent with.
    async fn dispatch(&self, request: &PendingRequest) -> Result<(Response, Option<String>), ApiError> {
        let url = join_url(&self.base_url, &request.path);
        let mut retries = 0;
        let mut backoff = self.retry.initial_backoff;

        loop {
            let token = self.current_token();
            let mut builder = self
                .client
                .request(request.method.clone(), &url)
                .headers(Self::auth_headers(token.as_deref())?);
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(ref body) = request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS && retries < self.retry.max_retries {
                retries += 1;
                warn!(
                    path = %request.path,
                    retry = retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            return Ok((response, token));
        }
    }

    /// Run `request` through the credential protocol.
    ///
    /// - 401 on a first attempt: refresh the session, then replay once with
    ///   the (possibly rotated) token. A refresh failure is returned as
    ///   `SessionExpired`; the session is already logged out by then.
    /// - 401 on a replay: `Unauthorized`, no second refresh.
    /// - 403: the session is logged out and `AccessDenied` returned.
    /// - Anything else is handed back unchanged.
    pub async fn execute(&self, mut request: PendingRequest) -> Result<Response, ApiError> {
        loop {
            let (response, sent_token) = self.dispatch(&request).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if request.retried {
                    debug!(path = %request.path, "Unauthorized after replay");
                    return Err(ApiError::Unauthorized);
                }
                request.retried = true;

                let current = self.current_token();
                if current.is_some() && current != sent_token {
                    // Someone else refreshed while this request was in flight.
                    debug!(path = %request.path, "Access token changed since dispatch, replaying");
                } else {
                    debug!(path = %request.path, "Unauthorized, refreshing session");
                    self.auth
                        .refresh()
                        .await
                        .map_err(ApiError::SessionExpired)?;
                }
                continue;
            }

            if status == StatusCode::FORBIDDEN {
                warn!(path = %request.path, "Admin access required, signing out");
                let body = response.text().await.unwrap_or_default();
                self.auth.logout().await;
                return Err(ApiError::from_status(status, &body));
            }

            return Ok(response);
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Execute and decode a JSON response body
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = Self::check_response(self.execute(request).await?).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// Execute, discarding the response body
    pub(crate) async fn send(&self, request: PendingRequest) -> Result<(), ApiError> {
        Self::check_response(self.execute(request).await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h/api", "/orders"), "http://h/api/orders");
        assert_eq!(join_url("http://h/api/", "orders"), "http://h/api/orders");
        assert_eq!(join_url("http://h/api/", "/orders/3"), "http://h/api/orders/3");
    }

    #[test]
    fn test_auth_headers_attach_bearer_only_when_present() {
        let headers = ApiClient::auth_headers(Some("T1")).unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer T1");

        let headers = ApiClient::auth_headers(None).unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_headers_reject_control_characters() {
        assert!(matches!(
            ApiClient::auth_headers(Some("bad\ntoken")),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_pending_request_builder() {
        let request = PendingRequest::get("/search/suggestions")
            .query("q", "lamp")
            .json(&serde_json::json!({ "status": "shipped" }))
            .unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query, vec![("q".to_string(), "lamp".to_string())]);
        assert_eq!(request.body.as_ref().unwrap()["status"], "shipped");
        assert!(!request.retried());
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_backoff, Duration::from_secs(1));
    }
}
