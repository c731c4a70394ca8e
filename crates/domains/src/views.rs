//! Read-side views assembled by the response composition layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Role, Suspension, Topic, User};

/// The public face of an account, embedded wherever a user is referenced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub profile_image: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            profile_image: user.profile_image.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikeView {
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
}

/// Viewer-relative membership flags. Only computed when the viewer is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewerFlags {
    pub is_liked: bool,
    pub is_followed: bool,
    pub is_bookmarked: bool,
}

/// A thread with its references resolved and its counters computed at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub topic: Topic,
    /// `None` once the creator's account has been deleted
    pub creator: Option<UserSummary>,
    pub likes: Vec<LikeView>,
    pub total_like: u64,
    pub total_comment: u64,
    pub total_follow: u64,
    pub total_bookmark: u64,
    pub total_report: u64,
    #[serde(flatten)]
    pub viewer: Option<ViewerFlags>,
    pub suspension: Option<Suspension>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author: UserSummary,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowResponse {
    pub id: Uuid,
    pub user: UserSummary,
    pub thread: ThreadResponse,
    pub notification: i64,
    pub total_comment: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmarkResponse {
    pub id: Uuid,
    pub thread: ThreadResponse,
    pub created_at: DateTime<Utc>,
}

/// Moderator dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub total: u64,
    pub users: u64,
    pub threads: u64,
}
