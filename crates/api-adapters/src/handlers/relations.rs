//! Follows and bookmarks, always on behalf of the caller.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Bookmark, BookmarkResponse, FollowRelation, FollowResponse};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::Viewer;
use crate::state::AppState;

pub async fn follow_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<FollowRelation>)> {
    let follow = state.services.follows.create(user.id, thread_id).await?;
    Ok((StatusCode::CREATED, Json(follow)))
}

pub async fn unfollow_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.follows.delete(user.id, thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Acknowledges the unread counter of the caller's follow.
pub async fn mark_seen(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.follows.reset_notification(thread_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_follows(State(state): State<AppState>, Viewer(user): Viewer) -> ApiResult<Json<Vec<FollowResponse>>> {
    let services = &state.services;
    let follows = services.follows.list_by_user(user.id).await?;
    Ok(Json(services.composer.follow_list(&follows).await?))
}

pub async fn bookmark_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Bookmark>)> {
    let bookmark = state.services.bookmarks.create(user.id, thread_id).await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

pub async fn unbookmark_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.bookmarks.delete(user.id, thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_bookmarks(
    State(state): State<AppState>,
    Viewer(user): Viewer,
) -> ApiResult<Json<Vec<BookmarkResponse>>> {
    let services = &state.services;
    let bookmarks = services.bookmarks.list_by_user(user.id).await?;
    Ok(Json(services.composer.bookmark_list(&bookmarks).await?))
}
