//! In-process stores on top of `DashMap`.
//!
//! Each map entry is guarded by its shard lock, so a read-check-write done
//! under one `get_mut` or `entry` is atomic with respect to other callers.
//! That is what gives like/follow/bookmark/report uniqueness here; the
//! PostgreSQL adapter gets the same from conditional statements and unique
//! indexes.

mod accounts;
mod comments;
mod media;
mod relations;
mod threads;

use std::sync::Arc;

pub use accounts::{MemoryTopicRepository, MemoryUserRepository};
pub use comments::MemoryCommentRepository;
pub use media::MemoryMediaStore;
pub use relations::{MemoryBookmarkRepository, MemoryFollowRepository, MemoryReportRepository};
pub use threads::MemoryThreadRepository;

/// One instance of every in-memory repository.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub users: Arc<MemoryUserRepository>,
    pub topics: Arc<MemoryTopicRepository>,
    pub threads: Arc<MemoryThreadRepository>,
    pub comments: Arc<MemoryCommentRepository>,
    pub follows: Arc<MemoryFollowRepository>,
    pub bookmarks: Arc<MemoryBookmarkRepository>,
    pub reports: Arc<MemoryReportRepository>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Offset pagination over an already sorted vector.
pub(crate) fn slice_page<T>(items: Vec<T>, skip: u64, limit: u64) -> Vec<T> {
    items
        .into_iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}
