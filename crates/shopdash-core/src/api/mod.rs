//! REST API client module for the shop backend.
//!
//! This module provides the `ApiClient`, the single path every dashboard
//! call takes. It attaches the stored access token as a bearer credential,
//! refreshes the session and replays once on 401, and signs out on 403.
//!
//! Typed endpoint functions live in `endpoints` and carry no auth logic.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ApiClient, PendingRequest, RetryPolicy};
pub use error::ApiError;
