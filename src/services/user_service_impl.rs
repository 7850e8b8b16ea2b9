//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{Store, User, hash_password};
use crate::services::user_service::{NewUser, UserChanges, UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Argon2 is CPU-bound, so hashing runs off the async workers.
    async fn hash(&self, password: String) -> Result<String, UserError> {
        let security = self.security.clone();
        let hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| UserError::Internal(format!("Password hashing task panicked: {e}")))??;
        Ok(hash)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserError> {
        // Cheap lookup first so a duplicate doesn't pay for a hash.
        if self
            .store
            .get_user_by_username(&new_user.username)
            .await?
            .is_some()
        {
            return Err(UserError::Conflict(new_user.username));
        }

        let password_hash = self.hash(new_user.password).await?;

        let user = self
            .store
            .create_user(&new_user.username, password_hash)
            .await?
            .ok_or_else(|| UserError::Conflict(new_user.username.clone()))?;

        info!(user_id = user.id, "User - {} was created", user.username);

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.list_users().await?)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, UserError> {
        let password_hash = match changes.password {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };
        let password_changed = password_hash.is_some();
        let username_changed = changes.username.is_some();

        let updated = self
            .store
            .update_user(id, changes.username, password_hash)
            .await?
            .ok_or(UserError::NotFound(id))?;

        if username_changed {
            info!(
                user_id = id,
                "User - {} was updated to {}", updated.previous_username, updated.user.username
            );
        }
        if password_changed {
            info!(
                user_id = id,
                "User - {} password was updated", updated.user.username
            );
        }

        Ok(updated.user)
    }

    async fn delete_user(&self, id: i32) -> Result<User, UserError> {
        let user = self
            .store
            .delete_user(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        info!(user_id = id, "User - {} was deleted", user.username);

        Ok(user)
    }
}
