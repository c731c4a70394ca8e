//! # Core Traits (Ports)
//!
//! One persistence contract per aggregate plus the media store. Adapters in
//! `storage-adapters` implement these; services only ever see the traits.
//! Every call is independently bounded by the adapter's timeout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::media::MediaUpload;
use crate::models::{
    ArrayMutation, Bookmark, Comment, FollowRelation, Like, Report, ReportedType, Suspension,
    Thread, ThreadChanges, Topic, User,
};
use crate::query::{ThreadFilter, ThreadSort};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// Returns false when no such user exists.
    async fn set_active(&self, id: Uuid, is_active: bool, at: DateTime<Utc>) -> Result<bool>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Returns false, without writing, when the name is already taken.
    async fn insert_unique(&self, topic: &Topic) -> Result<bool>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Topic>>;
    async fn list(&self) -> Result<Vec<Topic>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn insert(&self, thread: &Thread) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>>;
    async fn update_content(&self, id: Uuid, changes: &ThreadChanges, at: DateTime<Utc>) -> Result<bool>;
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Appends `like` unless the list already holds an entry for the same user.
    /// Must be a single atomic document update, never read-modify-write.
    async fn push_like(&self, id: Uuid, like: Like) -> Result<ArrayMutation>;
    /// Removes the entry keyed by `user_id`, atomically.
    async fn pull_like(&self, id: Uuid, user_id: Uuid) -> Result<ArrayMutation>;
    /// Removes `user_id`'s likes from every thread. Returns the number of threads touched.
    async fn pull_likes_by_user(&self, user_id: Uuid) -> Result<u64>;

    /// Sets (or clears, with `None`) the suspension fields of every thread by `creator_id`.
    async fn set_suspension_by_creator(
        &self,
        creator_id: Uuid,
        suspension: Option<Suspension>,
        at: DateTime<Utc>,
    ) -> Result<u64>;

    async fn find_page(&self, filter: &ThreadFilter, sort: ThreadSort, skip: u64, limit: u64) -> Result<Vec<Thread>>;
    async fn count(&self, filter: &ThreadFilter) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>>;
    async fn update(&self, comment: &Comment) -> Result<bool>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64>;

    async fn find_by_thread(&self, thread_id: Uuid) -> Result<Vec<Comment>>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Comment>>;
    async fn find_replies(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>>;
    /// Creation order, oldest first.
    async fn find_page_by_thread(&self, thread_id: Uuid, skip: u64, limit: u64) -> Result<Vec<Comment>>;
    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Returns false, without writing, when (user, thread) already has a relation.
    async fn insert_unique(&self, follow: &FollowRelation) -> Result<bool>;
    async fn find(&self, user_id: Uuid, thread_id: Uuid) -> Result<Option<FollowRelation>>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<FollowRelation>>;
    async fn delete(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool>;
    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64>;
    async fn delete_by_thread(&self, thread_id: Uuid) -> Result<u64>;

    /// Adds one to the counter of every follower of `thread_id`, skipping `except`.
    async fn increment_notifications(&self, thread_id: Uuid, except: Option<Uuid>) -> Result<u64>;
    async fn reset_notification(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool>;
    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Returns false, without writing, when (user, thread) is already bookmarked.
    async fn insert_unique(&self, bookmark: &Bookmark) -> Result<bool>;
    async fn find(&self, user_id: Uuid, thread_id: Uuid) -> Result<Option<Bookmark>>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Bookmark>>;
    async fn delete(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool>;
    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64>;
    async fn delete_by_thread(&self, thread_id: Uuid) -> Result<u64>;
    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Returns false, without writing, when the reporter already reported that target.
    async fn insert_unique(&self, report: &Report) -> Result<bool>;
    async fn delete_by_target(&self, reported_id: Uuid) -> Result<u64>;
    /// Newest first.
    async fn find_page(&self, reported_type: Option<ReportedType>, skip: u64, limit: u64) -> Result<Vec<Report>>;
    async fn count_by_target(&self, reported_id: Uuid) -> Result<u64>;
    async fn count_all(&self) -> Result<u64>;
    async fn count_by_type(&self, reported_type: ReportedType) -> Result<u64>;
}

/// Object storage contract for user uploaded images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `file` as `namespace/desired_name` and returns its public URL.
    async fn upload(&self, namespace: &str, file: MediaUpload, desired_name: &str) -> Result<String>;
    /// Removes `namespace/filename`, where `filename` comes from `media::filename_from_url`.
    async fn delete(&self, namespace: &str, filename: &str) -> Result<()>;
}
