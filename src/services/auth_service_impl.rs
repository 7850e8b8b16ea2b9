//! In-process credential store backing the `AuthService` trait.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::task;

use crate::config::{AdminConfig, SecurityConfig};
use crate::db::{hash_password, verify_password_hash};
use crate::services::auth_service::{AuthError, AuthService};

/// Username to Argon2 hash, built once at startup and never mutated.
pub struct CredentialStore {
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    /// Builds the store from the `[admin]` config section, hashing a plaintext
    /// password if no precomputed hash is given.
    pub fn from_config(admin: &AdminConfig, security: &SecurityConfig) -> Result<Self> {
        let password_hash = match (&admin.password_hash, &admin.password) {
            (Some(hash), _) => hash.clone(),
            (None, Some(password)) => hash_password(password, security)
                .context("Failed to hash admin password")?,
            (None, None) => anyhow::bail!("Admin credential has no password configured"),
        };

        let mut credentials = HashMap::new();
        credentials.insert(admin.username.clone(), password_hash);

        Ok(Self { credentials })
    }
}

#[async_trait]
impl AuthService for CredentialStore {
    async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let Some(password_hash) = self.credentials.get(username).cloned() else {
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || verify_password_hash(&password_hash, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task panicked: {e}")))??;

        if is_valid {
            Ok(username.to_string())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
