//! Domain service for authenticating the administrative principal.
//!
//! Credentials are fixed at startup; the user table plays no part here.

use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies a username/password pair and returns the authenticated principal.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown username or a
    /// wrong password.
    async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError>;
}
