//! Domain service for managing user records.
//!
//! Handles creation, listing, in-place updates and deletion. Password
//! plaintexts enter here and leave only as hashes.

use thiserror::Error;

use crate::db::User;

/// A validated create request.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// A validated update request; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(i32),

    #[error("Username already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for user records.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a user and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] if the username is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserError>;

    /// Lists all users in id order.
    async fn list_users(&self) -> Result<Vec<User>, UserError>;

    /// Applies the given changes to an existing user.
    ///
    /// Username uniqueness is not re-checked here; the store's unique index
    /// rejects a collision.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if no user has this id.
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, UserError>;

    /// Deletes a user and returns the removed record.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if no user has this id.
    async fn delete_user(&self, id: i32) -> Result<User, UserError>;
}
