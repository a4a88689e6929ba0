//! Authentication module for managing the admin session.
//!
//! This module provides:
//! - `SessionManager`: login, logout, single-flight refresh and startup restoration
//! - `CredentialStore`: durable token storage (keychain, file or memory)
//! - `SessionAuthenticator`: the capability the request pipeline calls back into
//!
//! Tokens are persisted under the keys `access_token` and `refresh_token`.

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod manager;
pub mod session;

pub use authenticator::SessionAuthenticator;
pub use credentials::{CredentialStore, FileStore, KeyringStore, MemoryStore, TokenKey};
pub use error::AuthError;
pub use manager::SessionManager;
pub use session::{SessionState, SessionView};
