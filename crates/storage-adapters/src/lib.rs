//! # storage-adapters
//!
//! Implementations of the `domains` ports.
//!
//! - [`memory`]: DashMap-backed stores, always compiled. Used by tests and
//!   single-node development.
//! - `postgres` (feature `db-postgres`): sqlx/PostgreSQL.
//! - `media_local` (feature `media-local`): uploads on the local filesystem.
//!
//! Adapters that perform real I/O wrap every call in [`timeout::bounded`].

pub mod memory;
pub mod timeout;

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "media-local")]
pub mod media_local;

pub use memory::{MemoryMediaStore, MemoryStore};
