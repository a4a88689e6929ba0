use async_trait::async_trait;

use super::AuthError;

/// What the request pipeline needs from the session: a way to mint a fresh
/// access token and a way to end the session.
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    /// On failure the implementation has already logged the session out.
    async fn refresh(&self) -> Result<(), AuthError>;

    /// Never fails; the session is unauthenticated afterwards.
    async fn logout(&self);
}
