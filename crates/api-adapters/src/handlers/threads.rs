use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Page, PageRequest, SortDirection, SortField, Thread, ThreadChanges, ThreadFilter, ThreadResponse, ThreadSort};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, MaybeViewer, Viewer};
use crate::handlers::PageQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewThread {
    pub topic_id: Uuid,
    pub title: String,
    pub description: String,
}

/// `GET /threads` query. `sort` is `created_at`, `updated_at` or `title`; `order` is `asc` or `desc`.
#[derive(Debug, Default, Deserialize)]
pub struct ThreadListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub topic_id: Option<Uuid>,
    pub title: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    #[serde(default)]
    pub include_suspended: bool,
}

impl ThreadListQuery {
    fn sort(&self) -> ApiResult<ThreadSort> {
        let field = match self.sort.as_deref() {
            Some(raw) => raw.parse::<SortField>()?,
            None => SortField::default(),
        };
        let direction = match self.order.as_deref() {
            Some(raw) => raw.parse::<SortDirection>()?,
            None => SortDirection::default(),
        };
        Ok(ThreadSort { field, direction })
    }

    fn page_request(&self) -> PageRequest {
        PageQuery { page: self.page, limit: self.limit }.request()
    }
}

pub async fn create_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    JsonBody(body): JsonBody<NewThread>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let services = &state.services;
    let thread = services.threads.create(user.id, body.topic_id, &body.title, &body.description).await?;
    let response = services.composer.thread_response(&thread, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_threads(
    State(state): State<AppState>,
    viewer: MaybeViewer,
    Query(query): Query<ThreadListQuery>,
) -> ApiResult<Json<Page<ThreadResponse>>> {
    if query.include_suspended && !viewer.is_admin() {
        return Err(ApiError::AdminOnly);
    }
    let filter = ThreadFilter {
        topic_id: query.topic_id,
        title: query.title.clone(),
        include_suspended: query.include_suspended,
    };
    let services = &state.services;
    let page = services.threads.paginate(&filter, query.sort()?, query.page_request()).await?;
    Ok(Json(services.composer.thread_page(page, viewer.id()).await?))
}

pub async fn get_thread(
    State(state): State<AppState>,
    viewer: MaybeViewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<Json<ThreadResponse>> {
    let services = &state.services;
    let thread = services.threads.get(thread_id).await?;
    Ok(Json(services.composer.thread_response(&thread, viewer.id()).await?))
}

pub async fn update_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
    JsonBody(changes): JsonBody<ThreadChanges>,
) -> ApiResult<Json<ThreadResponse>> {
    let services = &state.services;
    let thread = services.threads.update(user.id, thread_id, changes, user.is_admin()).await?;
    Ok(Json(services.composer.thread_response(&thread, Some(user.id)).await?))
}

/// Returns the thread as it was before the cascade removed it.
pub async fn delete_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<Json<Thread>> {
    let thread = state.services.coordinator.delete_thread(user.id, thread_id, user.is_admin()).await?;
    Ok(Json(thread))
}

pub async fn like_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.threads.like(user.id, thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlike_thread(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.threads.unlike(user.id, thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
