//! # Domain Models
//!
//! These structs represent the core entities of Agora.
//! We use UUID v7 for time-ordered, globally unique identification.
//! Collections reference each other by opaque ID only; the Thread is the one
//! aggregate that embeds child data (its likes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

/// Account capability level. Admin accounts are protected from deletion and suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// A registered account. Credentials live with the auth collaborator, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// URL of the profile picture in the media store
    pub profile_image: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username: username.into(),
            email: email.into(),
            profile_image: None,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A category every thread is filed under. Names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One entry of a thread's embedded like list. At most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn now(user_id: Uuid) -> Self {
        Self { user_id, created_at: Utc::now() }
    }
}

/// Moderation state carried by a thread. Absent means the thread is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspension {
    pub status: String,
    pub detail: String,
}

impl Suspension {
    pub const STATUS_SUSPENDED: &'static str = "suspended";

    /// Applied in bulk to every thread of a suspended account.
    pub fn creator_suspended() -> Self {
        Self {
            status: Self::STATUS_SUSPENDED.to_string(),
            detail: "This thread is hidden because its author has been suspended.".to_string(),
        }
    }

    /// Applied to a single thread by an admin.
    pub fn by_moderator(detail: Option<String>) -> Self {
        Self {
            status: Self::STATUS_SUSPENDED.to_string(),
            detail: detail
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| "This thread has been suspended by a moderator.".to_string()),
        }
    }
}

/// An admin's direct change to one thread's moderation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SuspensionChange {
    Suspend {
        #[serde(default)]
        detail: Option<String>,
    },
    Lift,
}

impl SuspensionChange {
    /// The suspension the thread carries once the change is applied.
    pub fn resolve(&self) -> Option<Suspension> {
        match self {
            SuspensionChange::Suspend { detail } => Some(Suspension::by_moderator(detail.clone())),
            SuspensionChange::Lift => None,
        }
    }
}

/// A discussion thread. Owns its like list outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    /// Ordered by insertion; uniqueness per user is enforced by the store's conditional push
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub suspension: Option<Suspension>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    pub fn new(
        creator_id: Uuid,
        topic_id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            topic_id,
            creator_id,
            title: title.into(),
            description: description.into(),
            likes: Vec::new(),
            suspension: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.iter().any(|like| like.user_id == user_id)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspension.is_some()
    }
}

/// Mutable fields of a thread, applied by its creator or an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadChanges {
    pub topic_id: Uuid,
    pub title: String,
    pub description: String,
    /// Admin only. Absent leaves the suspension as it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension: Option<SuspensionChange>,
}

/// A comment on a thread. Replies point at a top-level comment through `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    /// URL of the attached image in the media store
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Join entity between a user and a thread they follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowRelation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub thread_id: Uuid,
    /// Unread comments by other users since the follower last acknowledged
    pub notification: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FollowRelation {
    pub fn new(user_id: Uuid, thread_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            thread_id,
            notification: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub thread_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(user_id: Uuid, thread_id: Uuid) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), user_id, thread_id, created_at: now, updated_at: now }
    }
}

/// What a report points at. Resolved by the system, never supplied by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedType {
    User,
    Thread,
}

impl ReportedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportedType::User => "user",
            ReportedType::Thread => "thread",
        }
    }
}

impl fmt::Display for ReportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportedType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ReportedType::User),
            "thread" => Ok(ReportedType::Thread),
            other => Err(AppError::Validation(format!("unknown report type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reported_type: ReportedType,
    pub report_detail: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub const DEFAULT_DETAIL: &'static str = "Reported by a community member for moderator review.";

    pub fn new(reporter_id: Uuid, reported_id: Uuid, reported_type: ReportedType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            reporter_id,
            reported_id,
            reported_type,
            report_detail: Self::DEFAULT_DETAIL.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of a conditional single-document array mutation (like push/pull).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMutation {
    /// The element was added or removed.
    Applied,
    /// The document exists but the guard rejected the change.
    Unchanged,
    /// No document with that ID.
    Missing,
}
