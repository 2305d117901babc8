//! Authentication endpoint traits.

use async_trait::async_trait;

use crate::{AccessCredential, Credentials, RefreshCredential, Result};

/// Output from a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    /// The freshly issued access credential.
    pub access_credential: AccessCredential,
    /// The freshly issued refresh credential.
    pub refresh_credential: RefreshCredential,
    /// Organization of the logged-in user, if the server reports one.
    pub organization_id: Option<String>,
    /// Identifier of the logged-in user.
    pub user_id: String,
}

/// Trades a refresh credential for a new access credential.
#[async_trait]
pub trait RefreshClient: Send + Sync {
    /// Exchange `refresh_credential` for a new access credential.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCredential`](crate::Error::InvalidCredential) when the
    ///   server reports the refresh credential or user id as invalid
    /// - [`Error::Transport`](crate::Error::Transport) on network failure or a
    ///   malformed response envelope
    /// - [`Error::Server`](crate::Error::Server) for any other reported failure
    async fn refresh(&self, refresh_credential: &RefreshCredential) -> Result<AccessCredential>;
}

/// The full authentication operation family.
#[async_trait]
pub trait AuthBackend: RefreshClient {
    /// Authenticate with email and password.
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutput>;

    /// Create a new account. Returns the number of affected rows.
    async fn register(&self, credentials: &Credentials) -> Result<u64>;

    /// Change the password of `user_id`. Returns the number of affected rows.
    ///
    /// The request is authorized with `access_credential`.
    async fn change_password(
        &self,
        access_credential: &AccessCredential,
        user_id: &str,
        new_password: &str,
    ) -> Result<u64>;
}
