//! Reports and the admin account actions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Page, Report, ReportStats, ReportedType, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Admin, JsonBody, Viewer};
use crate::handlers::PageQuery;
use crate::state::AppState;

/// The target may be a user or a thread; the service works out which.
#[derive(Debug, Deserialize)]
pub struct NewReport {
    pub reported_id: Uuid,
}

pub async fn create_report(
    State(state): State<AppState>,
    Viewer(user): Viewer,
    JsonBody(body): JsonBody<NewReport>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let report = state.services.reports.create(user.id, body.reported_id).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportListQuery {
    #[serde(rename = "type")]
    pub reported_type: Option<ReportedType>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub async fn list_reports(
    State(state): State<AppState>,
    Admin(_): Admin,
    Query(query): Query<ReportListQuery>,
) -> ApiResult<Json<Page<Report>>> {
    let request = PageQuery { page: query.page, limit: query.limit }.request();
    Ok(Json(state.services.reports.list(query.reported_type, request).await?))
}

pub async fn report_stats(State(state): State<AppState>, Admin(_): Admin) -> ApiResult<Json<ReportStats>> {
    Ok(Json(state.services.reports.stats().await?))
}

/// Returns the removed account.
pub async fn delete_user(
    State(state): State<AppState>,
    Admin(_): Admin,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.services.coordinator.delete_user(user_id).await?))
}

#[derive(Debug, Serialize)]
pub struct SuspensionOutcome {
    pub user_id: Uuid,
    pub is_active: bool,
    /// Threads whose suspension fields changed
    pub threads: u64,
}

pub async fn suspend_user(
    State(state): State<AppState>,
    Admin(_): Admin,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<SuspensionOutcome>> {
    let threads = state.services.coordinator.suspend_user(user_id).await?;
    Ok(Json(SuspensionOutcome { user_id, is_active: false, threads }))
}

pub async fn unsuspend_user(
    State(state): State<AppState>,
    Admin(_): Admin,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<SuspensionOutcome>> {
    let threads = state.services.coordinator.unsuspend_user(user_id).await?;
    Ok(Json(SuspensionOutcome { user_id, is_active: true, threads }))
}
