//! # services
//!
//! Business logic of the forum consistency subsystem. Every service holds the
//! ports it needs behind `Arc`, keeps no mutable state of its own, and returns
//! the specific `AppError` of the step that failed.
//!
//! Multi-collection work (thread/user deletion, suspension, comment fan-out)
//! lives in [`coordinator::Coordinator`]; read-side assembly lives in
//! [`composer::ResponseComposer`].

pub mod bookmark_service;
pub mod comment_service;
pub mod composer;
pub mod coordinator;
pub mod follow_service;
pub mod report_service;
pub mod thread_service;
pub mod topic_service;
pub mod user_service;

use std::sync::Arc;

use domains::{
    AppError, BookmarkRepository, CommentRepository, FollowRepository, MediaStore, ReportRepository,
    Result, ThreadRepository, TopicRepository, UserRepository,
};
use uuid::Uuid;

pub use bookmark_service::BookmarkService;
pub use comment_service::{CommentService, NewComment};
pub use composer::ResponseComposer;
pub use coordinator::{Coordinator, NotificationPolicy};
pub use follow_service::FollowService;
pub use report_service::ReportService;
pub use thread_service::ThreadService;
pub use topic_service::TopicService;
pub use user_service::UserService;

/// The adapters a deployment plugs in.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub threads: Arc<dyn ThreadRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub media: Arc<dyn MediaStore>,
}

/// Fully wired service graph, shared across request handlers.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<UserService>,
    pub topics: Arc<TopicService>,
    pub threads: Arc<ThreadService>,
    pub comments: Arc<CommentService>,
    pub follows: Arc<FollowService>,
    pub bookmarks: Arc<BookmarkService>,
    pub reports: Arc<ReportService>,
    pub coordinator: Arc<Coordinator>,
    pub composer: Arc<ResponseComposer>,
}

impl Services {
    pub fn new(repos: Repositories, policy: NotificationPolicy) -> Self {
        let users = Arc::new(UserService::new(repos.users.clone()));
        let topics = Arc::new(TopicService::new(repos.topics.clone()));
        let threads = Arc::new(ThreadService::new(repos.threads.clone(), repos.topics.clone()));
        let comments = Arc::new(CommentService::new(
            repos.comments.clone(),
            repos.threads.clone(),
            repos.media.clone(),
        ));
        let follows = Arc::new(FollowService::new(
            repos.follows.clone(),
            repos.users.clone(),
            repos.threads.clone(),
        ));
        let bookmarks = Arc::new(BookmarkService::new(repos.bookmarks.clone(), repos.threads.clone()));
        let reports = Arc::new(ReportService::new(
            repos.reports.clone(),
            repos.users.clone(),
            repos.threads.clone(),
        ));

        let coordinator = Arc::new(Coordinator::new(
            users.clone(),
            threads.clone(),
            comments.clone(),
            follows.clone(),
            bookmarks.clone(),
            reports.clone(),
            repos.media.clone(),
            policy,
        ));
        let composer = Arc::new(ResponseComposer::new(
            users.clone(),
            topics.clone(),
            threads.clone(),
            comments.clone(),
            follows.clone(),
            bookmarks.clone(),
            reports.clone(),
        ));

        Self { users, topics, threads, comments, follows, bookmarks, reports, coordinator, composer }
    }
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Owners may always mutate their resource; admins only where the caller allows it.
pub(crate) fn ensure_owner(actor_id: Uuid, owner_id: Uuid, is_admin: bool, resource: &'static str) -> Result<()> {
    if is_admin || actor_id == owner_id {
        Ok(())
    } else {
        Err(AppError::NotOwner { actor_id, resource })
    }
}
