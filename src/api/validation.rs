use super::{ApiError, CreateUserRequest, UpdateUserRequest};
use crate::services::{NewUser, UserChanges};

pub fn validate_create_user(request: CreateUserRequest) -> Result<NewUser, ApiError> {
    match (request.username, request.password) {
        (Some(username), Some(password)) => Ok(NewUser { username, password }),
        _ => Err(ApiError::validation("Missing username or password")),
    }
}

pub fn validate_update_user(request: UpdateUserRequest) -> UserChanges {
    UserChanges {
        username: request.username,
        password: request.password,
    }
}
