//! agora/crates/domains/src/lib.rs
//!
//! The central domain model and interface definitions for Agora.

pub mod errors;
pub mod media;
pub mod models;
pub mod ports;
pub mod query;
pub mod views;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
pub use query::*;
pub use views::*;
