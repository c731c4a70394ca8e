//! # api-adapters
//!
//! The HTTP surface of agora. Handlers turn requests into service calls and
//! map `AppError` onto status codes; no business rule lives here.
//!
//! Identity is resolved upstream: the auth gateway forwards the caller's ID in
//! the `x-user-id` header, and the extractors load the account behind it.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
mod handlers;
#[cfg(feature = "web-axum")]
mod router;
#[cfg(feature = "web-axum")]
mod state;

#[cfg(feature = "web-axum")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "web-axum")]
pub use router::router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
