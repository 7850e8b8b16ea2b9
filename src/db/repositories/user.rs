use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    NotSet, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
        }
    }
}

/// Result of an in-place update, keeping the name the row had before.
#[derive(Debug, Clone)]
pub struct UpdatedUser {
    pub previous_username: String,
    pub user: User,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All users, oldest id first
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Insert a new user. Returns `None` when the username is already taken,
    /// whether caught by the lookup or by the unique index on a racing insert.
    pub async fn create(&self, username: &str, password_hash: String) -> Result<Option<User>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&txn)
            .await
            .context("Failed to query user by username")?;

        if existing.is_some() {
            return Ok(None);
        }

        let Some(model) = insert_user(&txn, username, password_hash).await? else {
            return Ok(None);
        };

        txn.commit().await.context("Failed to commit user insert")?;

        Ok(Some(User::from(model)))
    }

    /// Overwrite the given fields of a user; `None` fields are left as they are.
    /// Returns `None` when no row has this id.
    pub async fn update(
        &self,
        id: i32,
        username: Option<String>,
        password_hash: Option<String>,
    ) -> Result<Option<UpdatedUser>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let Some(model) = users::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let previous_username = model.username.clone();

        let mut active: users::ActiveModel = model.into();
        if let Some(username) = username {
            active.username = Set(username);
        }
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }

        let updated = active
            .update(&txn)
            .await
            .context("Failed to update user")?;

        txn.commit().await.context("Failed to commit user update")?;

        Ok(Some(UpdatedUser {
            previous_username,
            user: User::from(updated),
        }))
    }

    /// Delete a user, returning the removed row or `None` when no row has this id.
    pub async fn delete(&self, id: i32) -> Result<Option<User>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let Some(model) = users::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query user for deletion")?
        else {
            return Ok(None);
        };

        let user = User::from(model.clone());
        model
            .delete(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit().await.context("Failed to commit user deletion")?;

        Ok(Some(user))
    }

    /// Verify password for a user
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        task::spawn_blocking(move || verify_password_hash(&password_hash, &password))
            .await
            .context("Password verification task panicked")?
    }
}

/// Inserts a row, mapping a unique-index violation on `username` to `None`.
async fn insert_user<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    password_hash: String,
) -> Result<Option<users::Model>> {
    let active = users::ActiveModel {
        id: NotSet,
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
    };

    match active.insert(conn).await {
        Ok(model) => Ok(Some(model)),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e).context("Failed to insert user"),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None, // output length (use default)
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a PHC hash string.
///
/// The cost parameters are read from the hash itself, so hashes produced with
/// older settings keep verifying. Comparison is constant-time.
pub fn verify_password_hash(password_hash: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
