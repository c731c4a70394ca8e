//! Users, topics and the health probe.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Role, Topic, User, UserSummary};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Admin, JsonBody};
use crate::state::AppState;

pub async fn health() -> &'static str {
    "ok"
}

/// Called by the registration flow once credentials are stored elsewhere.
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.services.users.create(&body.username, &body.email, Role::User).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> ApiResult<Json<UserSummary>> {
    let user = state.services.users.get(user_id).await?;
    Ok(Json(UserSummary::from(&user)))
}

#[derive(Debug, Deserialize)]
pub struct NewTopic {
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_topic(
    State(state): State<AppState>,
    Admin(_): Admin,
    JsonBody(body): JsonBody<NewTopic>,
) -> ApiResult<(StatusCode, Json<Topic>)> {
    let topic = state.services.topics.create(&body.name, body.description).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

pub async fn list_topics(State(state): State<AppState>) -> ApiResult<Json<Vec<Topic>>> {
    Ok(Json(state.services.topics.list().await?))
}

pub async fn get_topic(State(state): State<AppState>, Path(topic_id): Path<Uuid>) -> ApiResult<Json<Topic>> {
    Ok(Json(state.services.topics.get(topic_id).await?))
}
