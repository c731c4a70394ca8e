//! Request extractors: caller identity and JSON bodies with API-shaped rejections.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::Method;
use domains::{AppError, User};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Set by the auth gateway once the caller's token has been verified.
pub const USER_ID_HEADER: &str = "x-user-id";

fn header_user_id(parts: &Parts) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let id = value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Some(id))
}

async fn load_caller(parts: &Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(id) = header_user_id(parts)? else {
        return Ok(None);
    };
    let user = state.services.users.find(id).await?.ok_or(ApiError::Unauthenticated)?;
    // Suspended accounts may still read.
    if !user.is_active && parts.method != Method::GET {
        return Err(AppError::AccountSuspended(user.id).into());
    }
    Ok(Some(user))
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Viewer(pub User);

impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        load_caller(parts, state).await?.map(Viewer).ok_or(ApiError::Unauthenticated)
    }
}

/// The caller when one is identified; anonymous reads get `None`.
#[derive(Debug, Clone)]
pub struct MaybeViewer(pub Option<User>);

impl MaybeViewer {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(User::is_admin)
    }
}

impl FromRequestParts<AppState> for MaybeViewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeViewer(load_caller(parts, state).await?))
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct Admin(pub User);

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Viewer(user) = Viewer::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::AdminOnly);
        }
        Ok(Admin(user))
    }
}

/// `axum::Json` whose rejection renders like every other API error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}
