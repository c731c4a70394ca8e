//! Comment routes. Create and update take `multipart/form-data` with a
//! `content` text field, an optional `parent_id` and an optional `image` file.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::media::MediaUpload;
use domains::{Comment, CommentResponse, Page};
use mime::Mime;
use services::NewComment;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Viewer;
use crate::handlers::PageQuery;
use crate::state::AppState;

#[derive(Debug, Default)]
struct CommentForm {
    content: Option<String>,
    parent_id: Option<Uuid>,
    image: Option<MediaUpload>,
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::BadRequest(err.body_text())
}

async fn read_form(mut multipart: Multipart) -> ApiResult<CommentForm> {
    let mut form = CommentForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("content") => form.content = Some(field.text().await.map_err(bad_multipart)?),
            Some("parent_id") => {
                let raw = field.text().await.map_err(bad_multipart)?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let id = Uuid::parse_str(raw)
                        .map_err(|_| ApiError::BadRequest("parent_id must be a UUID".into()))?;
                    form.parent_id = Some(id);
                }
            }
            Some("image") => {
                let content_type = field.content_type().and_then(|raw| raw.parse::<Mime>().ok());
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    form.image = Some(MediaUpload::new(bytes, content_type));
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

pub async fn post_comment(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(thread_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let form = read_form(multipart).await?;
    let input = NewComment {
        content: form.content.unwrap_or_default(),
        parent_id: form.parent_id,
        image: form.image,
    };
    let services = &state.services;
    let comment = services.coordinator.post_comment(thread_id, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(services.composer.comment_response(&comment).await?)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<CommentResponse>>> {
    let services = &state.services;
    let page = services.comments.list_by_thread(thread_id, query.request()).await?;
    Ok(Json(services.composer.comment_page(page).await?))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(comment_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<CommentResponse>> {
    let form = read_form(multipart).await?;
    let services = &state.services;
    let content = form.content.unwrap_or_default();
    let comment = services.comments.update(comment_id, user.id, &content, form.image).await?;
    Ok(Json(services.composer.comment_response(&comment).await?))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<Json<Comment>> {
    Ok(Json(state.services.comments.delete(comment_id, user.id).await?))
}
