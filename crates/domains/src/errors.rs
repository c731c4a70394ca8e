//! # AppError
//!
//! Centralized error handling for the Agora ecosystem.
//! Every service call returns the specific failure; `kind()` projects it onto
//! the coarse taxonomy the HTTP layer maps to status codes.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Coarse error classes shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    ExternalDependency,
    Validation,
    Internal,
}

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("topic not found with ID {0}")]
    TopicNotFound(Uuid),

    #[error("thread not found with ID {0}")]
    ThreadNotFound(Uuid),

    #[error("user not found with ID {0}")]
    UserNotFound(Uuid),

    #[error("comment not found with ID {0}")]
    CommentNotFound(Uuid),

    #[error("user {user_id} does not follow thread {thread_id}")]
    FollowNotFound { user_id: Uuid, thread_id: Uuid },

    #[error("user {user_id} has not bookmarked thread {thread_id}")]
    BookmarkNotFound { user_id: Uuid, thread_id: Uuid },

    /// The reported ID resolved to neither a user nor a thread
    #[error("report target not found with ID {0}")]
    TargetNotFound(Uuid),

    #[error("user {user_id} has not liked thread {thread_id}")]
    NotLiked { user_id: Uuid, thread_id: Uuid },

    #[error("user {user_id} already liked thread {thread_id}")]
    AlreadyLiked { user_id: Uuid, thread_id: Uuid },

    #[error("user {user_id} already follows thread {thread_id}")]
    AlreadyFollowing { user_id: Uuid, thread_id: Uuid },

    #[error("user {user_id} already bookmarked thread {thread_id}")]
    AlreadyBookmarked { user_id: Uuid, thread_id: Uuid },

    #[error("user {reporter_id} already reported {reported_id}")]
    AlreadyReported { reporter_id: Uuid, reported_id: Uuid },

    #[error("topic name '{0}' is already taken")]
    TopicNameTaken(String),

    #[error("user {actor_id} does not own this {resource}")]
    NotOwner { actor_id: Uuid, resource: &'static str },

    #[error("admin accounts cannot be deleted")]
    CannotDeleteAdmin,

    #[error("admin accounts cannot be suspended")]
    CannotSuspendAdmin,

    #[error("account {0} is suspended")]
    AccountSuspended(Uuid),

    /// Media store or another outside collaborator failed
    #[error("external dependency failed: {0}")]
    ExternalDependency(String),

    /// Malformed input (e.g., empty title, reply to a reply)
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence call exceeded its deadline
    #[error("{0} timed out")]
    Timeout(String),

    /// Infrastructure failure (e.g., DB down, broken row)
    #[error("storage error: {0}")]
    Storage(String),

    /// Some steps of a multi-collection cascade failed; the rest committed
    #[error("cascade incomplete: {0}")]
    CascadeIncomplete(CascadeReport),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::TopicNotFound(_)
            | AppError::ThreadNotFound(_)
            | AppError::UserNotFound(_)
            | AppError::CommentNotFound(_)
            | AppError::FollowNotFound { .. }
            | AppError::BookmarkNotFound { .. }
            | AppError::TargetNotFound(_)
            | AppError::NotLiked { .. } => ErrorKind::NotFound,
            AppError::AlreadyLiked { .. }
            | AppError::AlreadyFollowing { .. }
            | AppError::AlreadyBookmarked { .. }
            | AppError::AlreadyReported { .. }
            | AppError::TopicNameTaken(_) => ErrorKind::Conflict,
            AppError::NotOwner { .. }
            | AppError::CannotDeleteAdmin
            | AppError::CannotSuspendAdmin
            | AppError::AccountSuspended(_) => ErrorKind::Forbidden,
            AppError::ExternalDependency(_) => ErrorKind::ExternalDependency,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Timeout(_) | AppError::Storage(_) => ErrorKind::Internal,
            AppError::CascadeIncomplete(report) => report.kind(),
        }
    }
}

/// A specialized Result type for Agora logic.
pub type Result<T> = std::result::Result<T, AppError>;

/// Named stages of the thread and user deletion cascades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    ProfileImage,
    CommentImage,
    Comments,
    Follows,
    Bookmarks,
    Reports,
    Likes,
    ThreadSuspension,
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CascadeStep::ProfileImage => "profile_image",
            CascadeStep::CommentImage => "comment_image",
            CascadeStep::Comments => "comments",
            CascadeStep::Follows => "follows",
            CascadeStep::Bookmarks => "bookmarks",
            CascadeStep::Reports => "reports",
            CascadeStep::Likes => "likes",
            CascadeStep::ThreadSuspension => "thread_suspension",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeFailure {
    pub step: CascadeStep,
    /// The item the step was processing, when it concerns one item
    pub target: Option<Uuid>,
    pub kind: ErrorKind,
    pub message: String,
}

/// Failures collected while a cascade kept going past them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeReport {
    pub failures: Vec<CascadeFailure>,
}

impl CascadeReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed step. Nested cascade reports are flattened into this one.
    pub fn record(&mut self, step: CascadeStep, target: Option<Uuid>, error: AppError) {
        match error {
            AppError::CascadeIncomplete(inner) => self.failures.extend(inner.failures),
            other => self.failures.push(CascadeFailure {
                step,
                target,
                kind: other.kind(),
                message: other.to_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The kind of the first failure; a cascade fails the way its first broken step did.
    pub fn kind(&self) -> ErrorKind {
        self.failures.first().map(|f| f.kind).unwrap_or(ErrorKind::Internal)
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::CascadeIncomplete(self))
        }
    }
}

impl fmt::Display for CascadeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} step(s) failed", self.failures.len())?;
        for failure in &self.failures {
            match failure.target {
                Some(id) => write!(f, "; {} [{}]: {}", failure.step, id, failure.message)?,
                None => write!(f, "; {}: {}", failure.step, failure.message)?,
            }
        }
        Ok(())
    }
}
