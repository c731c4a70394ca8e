//! Error responses.
//!
//! Every failure leaves the API as `{ "code", "message" }`, plus the list of
//! failed steps when a cascade stopped short. Internal failures are logged
//! and their detail is withheld from the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::{AppError, CascadeFailure, ErrorKind};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("missing or unknown caller identity")]
    Unauthenticated,

    #[error("this action requires the admin role")]
    AdminOnly,

    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<CascadeFailure>,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::ExternalDependency => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn code_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Forbidden => "forbidden",
        ErrorKind::Validation => "validation",
        ErrorKind::ExternalDependency => "external_dependency",
        ErrorKind::Internal => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::App(err) => {
                let kind = err.kind();
                let status = status_for(kind);
                let failures = match &err {
                    AppError::CascadeIncomplete(report) => report.failures.clone(),
                    _ => Vec::new(),
                };
                let message = if kind == ErrorKind::Internal && failures.is_empty() {
                    error!(error = %err, "request failed");
                    "internal server error".to_string()
                } else {
                    if status.is_server_error() {
                        warn!(error = %err, "request failed");
                    }
                    err.to_string()
                };
                (status, ErrorBody { code: code_for(kind), message, failures })
            }
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorBody { code: "unauthenticated", message: self.to_string(), failures: Vec::new() },
            ),
            ApiError::AdminOnly => (
                StatusCode::FORBIDDEN,
                ErrorBody { code: "forbidden", message: self.to_string(), failures: Vec::new() },
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: "validation", message, failures: Vec::new() },
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{CascadeReport, CascadeStep};
    use uuid::Uuid;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (AppError::ThreadNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (AppError::AlreadyLiked { user_id: Uuid::nil(), thread_id: Uuid::nil() }, StatusCode::CONFLICT),
            (AppError::CannotDeleteAdmin, StatusCode::FORBIDDEN),
            (AppError::Validation("empty".into()), StatusCode::BAD_REQUEST),
            (AppError::ExternalDependency("media down".into()), StatusCode::BAD_GATEWAY),
            (AppError::Timeout("threads.find_by_id".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn cascade_failure_takes_the_status_of_its_first_step() {
        let mut report = CascadeReport::new();
        report.record(
            CascadeStep::CommentImage,
            Some(Uuid::nil()),
            AppError::ExternalDependency("media down".into()),
        );
        let response = ApiError::from(AppError::CascadeIncomplete(report)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn identity_errors() {
        assert_eq!(ApiError::Unauthenticated.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AdminOnly.into_response().status(), StatusCode::FORBIDDEN);
    }
}
