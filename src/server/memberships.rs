use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::membership::MembershipService;
use crate::server::AppState;
use crate::server::dto::SegmentSlug;
use crate::server::extract::{JsonBody, PathParam};
use crate::server::response::{ApiError, MessageResponse, StoreResultExt};

fn slugs_of(entries: Vec<SegmentSlug>) -> Vec<String> {
    entries.into_iter().map(|entry| entry.slug).collect()
}

pub async fn list_user_segments(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    let segments = MembershipService::new(state.store.as_ref()).list_memberships(id)?;

    Ok::<_, ApiError>(Json(segments))
}

pub async fn add_user_segments(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<Vec<SegmentSlug>>,
) -> impl IntoResponse {
    let added = MembershipService::new(state.store.as_ref())
        .add_memberships(id, &slugs_of(req))
        .not_found_as("User not found")?;

    let echoed: Vec<SegmentSlug> = added
        .into_iter()
        .map(|slug| SegmentSlug { slug })
        .collect();

    Ok::<_, ApiError>(Json(echoed))
}

pub async fn remove_user_segments(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<Vec<SegmentSlug>>,
) -> impl IntoResponse {
    MembershipService::new(state.store.as_ref())
        .remove_memberships(id, &slugs_of(req))
        .not_found_as("User not found")?;

    Ok::<_, ApiError>(Json(MessageResponse::new("Segments removed")))
}
