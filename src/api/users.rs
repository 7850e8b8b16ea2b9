use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{validate_create_user, validate_update_user};
use super::{ApiError, AppState, CreateUserRequest, UpdateUserRequest, UserDto};

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let Json(payload) = payload?;
    let new_user = validate_create_user(payload)?;

    let user = state.user_service.create_user(new_user).await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.user_service.list_users().await?;

    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserDto>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let user = state
        .user_service
        .update_user(id, validate_update_user(payload))
        .await?;

    Ok(Json(UserDto::from(user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    state.user_service.delete_user(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
