use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::server::AppState;
use crate::server::dto::SegmentRequest;
use crate::server::extract::{JsonBody, PathParam};
use crate::server::response::{ApiError, MessageResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_slug;

pub async fn list_segments(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let segments = state.store.list_segments()?;

    Ok::<_, ApiError>(Json(segments))
}

pub async fn get_segment(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    let segment = state
        .store
        .get_segment(id)?
        .or_not_found("Segment not found")?;

    Ok::<_, ApiError>(Json(segment))
}

pub async fn create_segment(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SegmentRequest>,
) -> impl IntoResponse {
    validate_slug(&req.slug)?;

    let segment = state.store.create_segment(&req.slug)?;
    tracing::info!(segment_id = segment.id, slug = %segment.slug, "created segment");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(segment)))
}

pub async fn update_segment(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<SegmentRequest>,
) -> impl IntoResponse {
    validate_slug(&req.slug)?;

    let segment = state
        .store
        .update_segment(id, &req.slug)
        .not_found_as("Segment not found")?;

    Ok::<_, ApiError>(Json(segment))
}

pub async fn delete_segment(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    if !state.store.soft_delete_segment(id)? {
        return Err(ApiError::not_found("Segment not found"));
    }
    tracing::info!(segment_id = id, "deleted segment");

    Ok(Json(MessageResponse::new("Segment deleted")))
}
