//! In-process fake of the shop API for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::path::FullPath;
use warp::{Filter, Reply};

use shopdash_core::api::client::RetryPolicy;
use shopdash_core::auth::{CredentialStore, MemoryStore, TokenKey};
use shopdash_core::{ApiClient, SessionManager};

pub const EMAIL: &str = "admin@shop.ro";
pub const PASSWORD: &str = "secret";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct FakeState {
    /// Bearer token data endpoints accept
    pub valid_access: String,
    /// Refresh token the verify endpoint accepts
    pub valid_refresh: String,
    /// Access token handed out (and from then on accepted) by verify
    pub rotate_to: Option<String>,
    /// Forces the verify endpoint to answer with this status
    pub verify_status: Option<u16>,
    pub verify_delay: Duration,
    pub logout_status: u16,
    pub forbidden: Vec<String>,
    pub always_unauthorized: Vec<String>,
    /// Number of upcoming data requests answered with 429
    pub rate_limited: u32,
    pub forgot_message: Option<String>,
    pub responses: HashMap<String, Value>,
    pub log: Vec<Recorded>,
}

impl Default for FakeState {
    fn default() -> Self {
        let mut responses = HashMap::new();
        responses.insert("/orders".to_string(), json!([order_json()]));
        responses.insert(
            "/analytics/stats".to_string(),
            json!({"totalRevenue": 1200.5, "totalOrders": 4, "totalProducts": 10, "pendingOrders": 1}),
        );
        Self {
            valid_access: "T1".to_string(),
            valid_refresh: "R1".to_string(),
            rotate_to: None,
            verify_status: None,
            verify_delay: Duration::ZERO,
            logout_status: 200,
            forbidden: Vec::new(),
            always_unauthorized: Vec::new(),
            rate_limited: 0,
            forgot_message: None,
            responses,
            log: Vec::new(),
        }
    }
}

pub fn user_json() -> Value {
    json!({"id": "u1", "name": "Admin", "email": EMAIL, "telefon": "0700000000"})
}

pub fn order_json() -> Value {
    json!({
        "id": 1, "products": "[]", "status": "pending", "price": 50.0,
        "adress": {"city": "Iasi", "line1": "Str. Mare 2", "line2": null,
                   "postal_code": "700000", "state": "IS", "country": "RO"},
        "email": "client@shop.ro", "date": "2024-05-01T12:00:00Z",
        "token": "t", "metaid": "m"
    })
}

#[derive(Clone)]
pub struct FakeApi {
    pub base_url: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub async fn start(state: FakeState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let shared = state.clone();

        let route = warp::method()
            .and(warp::path::full())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::bytes())
            .and(warp::any().map(move || shared.clone()))
            .and_then(
                |method: warp::http::Method,
                 path: FullPath,
                 authorization: Option<String>,
                 body: Bytes,
                 state: Arc<Mutex<FakeState>>| async move {
                    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    Ok::<_, Infallible>(
                        handle(state, method.as_str(), path.as_str(), authorization, body).await,
                    )
                },
            );

        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.state()
            .log
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn verify_calls(&self) -> usize {
        self.calls("POST", "/auth/verify").len()
    }

    pub fn logout_calls(&self) -> usize {
        self.calls("POST", "/auth/logout").len()
    }

    /// Session manager and API client over a shared in-memory store
    pub fn connect(&self, store: Arc<MemoryStore>) -> (SessionManager, ApiClient) {
        let http = reqwest::Client::new();
        let session = SessionManager::new(http.clone(), &self.base_url, store.clone());
        let api = ApiClient::new(http, &self.base_url, store, Arc::new(session.clone()))
            .with_retry_policy(RetryPolicy {
                max_retries: 3,
                initial_backoff: Duration::from_millis(5),
            });
        (session, api)
    }
}

pub fn stored(store: &MemoryStore, key: TokenKey) -> Option<String> {
    store.get(key).unwrap()
}

fn reply(status: u16, body: Value) -> warp::reply::Response {
    let status = StatusCode::from_u16(status).unwrap();
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

fn empty(status: u16) -> warp::reply::Response {
    let status = StatusCode::from_u16(status).unwrap();
    warp::reply::with_status(warp::reply(), status).into_response()
}

async fn handle(
    state: Arc<Mutex<FakeState>>,
    method: &str,
    full_path: &str,
    authorization: Option<String>,
    body: Value,
) -> warp::reply::Response {
    let path = full_path.strip_prefix("/api").unwrap_or(full_path).to_string();

    let delay = {
        let mut s = state.lock().unwrap();
        s.log.push(Recorded {
            method: method.to_string(),
            path: path.clone(),
            authorization: authorization.clone(),
            body: body.clone(),
        });
        if path == "/auth/verify" {
            s.verify_delay
        } else {
            Duration::ZERO
        }
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut s = state.lock().unwrap();
    match (method, path.as_str()) {
        ("POST", "/loginDash") => {
            if body["email"] == EMAIL && body["password"] == PASSWORD {
                reply(
                    200,
                    json!({
                        "access_token": s.valid_access,
                        "refresh_token": s.valid_refresh,
                        "loggedinuser": user_json(),
                    }),
                )
            } else {
                empty(401)
            }
        }
        ("POST", "/auth/verify") => {
            if let Some(status) = s.verify_status {
                return empty(status);
            }
            if body["refresh_token"] != s.valid_refresh.as_str() {
                return reply(401, json!({"message": "invalid refresh token"}));
            }
            let mut payload = json!({
                "user": user_json(),
                "transactions": {"userTransactions": [{"amount": 10}]},
            });
            if let Some(new_token) = s.rotate_to.clone() {
                s.valid_access = new_token.clone();
                payload["new_acces_token"] = Value::String(new_token);
            }
            reply(200, payload)
        }
        ("POST", "/auth/logout") => empty(s.logout_status),
        ("POST", "/forgot-password") => match s.forgot_message.clone() {
            Some(message) => reply(200, json!({ "message": message })),
            None => reply(200, json!({})),
        },
        _ => {
            if s.forbidden.contains(&path) {
                return reply(403, json!({"message": "Admin access required"}));
            }
            if s.rate_limited > 0 {
                s.rate_limited -= 1;
                return empty(429);
            }
            let expected = format!("Bearer {}", s.valid_access);
            if s.always_unauthorized.contains(&path) || authorization.as_deref() != Some(expected.as_str()) {
                return empty(401);
            }
            let body = s.responses.get(&path).cloned().unwrap_or_else(|| json!([]));
            reply(200, body)
        }
    }
}
