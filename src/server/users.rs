use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::server::AppState;
use crate::server::dto::UserRequest;
use crate::server::extract::{JsonBody, PathParam};
use crate::server::response::{ApiError, MessageResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_email, validate_user_name};

fn validate_user_request(req: &UserRequest) -> crate::error::Result<()> {
    validate_user_name(&req.name)?;
    validate_email(&req.email)
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let users = state.store.list_users()?;

    Ok::<_, ApiError>(Json(users))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    let user = state.store.get_user(id)?.or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(user))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UserRequest>,
) -> impl IntoResponse {
    validate_user_request(&req)?;

    let user = state.store.create_user(req.name.trim(), &req.email)?;
    tracing::info!(user_id = user.id, "created user");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<UserRequest>,
) -> impl IntoResponse {
    validate_user_request(&req)?;

    let user = state
        .store
        .update_user(id, req.name.trim(), &req.email)
        .not_found_as("User not found")?;

    Ok::<_, ApiError>(Json(user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    if !state.store.soft_delete_user(id)? {
        return Err(ApiError::not_found("User not found"));
    }
    tracing::info!(user_id = id, "deleted user");

    Ok(Json(MessageResponse::new("User deleted")))
}
