//! # Cascade Coordinator
//!
//! Orchestrates every operation that spans collections. There are no foreign
//! keys and no multi-document transactions underneath, so each step commits on
//! its own. The protocol is:
//!
//! 1. guard (existence, ownership, admin protection);
//! 2. clean every dependent collection, continuing past failures and
//!    collecting them in a [`CascadeReport`];
//! 3. delete the parent row only if step 2 was clean.
//!
//! A failed cascade therefore leaves the parent in place, and re-issuing the
//! same delete is the retry path. Every dependent step is idempotent.

use std::sync::Arc;

use domains::media::{self, PROFILE_IMAGES};
use domains::{AppError, CascadeReport, CascadeStep, Comment, MediaStore, Result, Thread, User};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    BookmarkService, CommentService, FollowService, NewComment, ReportService, ThreadService, UserService,
};

/// Whether a commenter's own follow record is bumped by their comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPolicy {
    #[default]
    ExcludeCommenter,
    IncludeCommenter,
}

impl NotificationPolicy {
    pub fn from_exclude_flag(exclude_commenter: bool) -> Self {
        if exclude_commenter {
            NotificationPolicy::ExcludeCommenter
        } else {
            NotificationPolicy::IncludeCommenter
        }
    }

    fn skipped(&self, commenter: Uuid) -> Option<Uuid> {
        match self {
            NotificationPolicy::ExcludeCommenter => Some(commenter),
            NotificationPolicy::IncludeCommenter => None,
        }
    }
}

pub struct Coordinator {
    users: Arc<UserService>,
    threads: Arc<ThreadService>,
    comments: Arc<CommentService>,
    follows: Arc<FollowService>,
    bookmarks: Arc<BookmarkService>,
    reports: Arc<ReportService>,
    media: Arc<dyn MediaStore>,
    policy: NotificationPolicy,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<UserService>,
        threads: Arc<ThreadService>,
        comments: Arc<CommentService>,
        follows: Arc<FollowService>,
        bookmarks: Arc<BookmarkService>,
        reports: Arc<ReportService>,
        media: Arc<dyn MediaStore>,
        policy: NotificationPolicy,
    ) -> Self {
        Self { users, threads, comments, follows, bookmarks, reports, media, policy }
    }

    /// Creates the comment, then notifies the thread's followers.
    ///
    /// The comment is committed before the fan-out runs. A fan-out failure is
    /// logged and the comment is still returned.
    pub async fn post_comment(&self, thread_id: Uuid, author_id: Uuid, input: NewComment) -> Result<Comment> {
        let comment = self.comments.create(thread_id, author_id, input).await?;
        if let Err(err) = self
            .follows
            .update_notification(thread_id, self.policy.skipped(author_id))
            .await
        {
            warn!(%thread_id, comment_id = %comment.id, error = %err, "follower notification fan-out failed");
        }
        Ok(comment)
    }

    /// Deletes a thread and everything that references it. Returns the
    /// pre-deletion snapshot.
    #[instrument(skip(self), fields(%thread_id))]
    pub async fn delete_thread(&self, actor_id: Uuid, thread_id: Uuid, is_admin: bool) -> Result<Thread> {
        let snapshot = self.threads.authorize_mutation(actor_id, thread_id, is_admin).await?;

        let mut report = CascadeReport::new();
        step(&mut report, CascadeStep::Comments, self.comments.delete_all_by_thread(thread_id).await);
        step(&mut report, CascadeStep::Follows, self.follows.delete_all_by_thread(thread_id).await);
        step(&mut report, CascadeStep::Bookmarks, self.bookmarks.delete_all_by_thread(thread_id).await);
        step(&mut report, CascadeStep::Reports, self.reports.delete_all_by_target(thread_id).await);

        if !report.is_empty() {
            warn!(failures = report.failures.len(), "thread cascade incomplete; thread row kept for retry");
            return Err(AppError::CascadeIncomplete(report));
        }

        self.threads.remove(thread_id).await?;
        info!(%actor_id, is_admin, "thread deleted");
        Ok(snapshot)
    }

    /// Deletes an account. Admins are protected. The user's threads survive,
    /// suspended, so other people's comments on them are not lost.
    #[instrument(skip(self), fields(%user_id))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<User> {
        let user = self.users.get(user_id).await?;
        if user.is_admin() {
            return Err(AppError::CannotDeleteAdmin);
        }

        let mut report = CascadeReport::new();
        if let Some(url) = &user.profile_image {
            step(&mut report, CascadeStep::ProfileImage, self.delete_profile_image(url).await);
        }
        step(&mut report, CascadeStep::Comments, self.comments.delete_all_by_user(user_id).await);
        step(&mut report, CascadeStep::Follows, self.follows.delete_all_by_user(user_id).await);
        step(&mut report, CascadeStep::Bookmarks, self.bookmarks.delete_all_by_user(user_id).await);
        step(&mut report, CascadeStep::Likes, self.threads.pull_likes_by_user(user_id).await);
        step(&mut report, CascadeStep::Reports, self.reports.delete_all_by_target(user_id).await);
        step(&mut report, CascadeStep::ThreadSuspension, self.threads.suspend_by_creator(user_id).await);

        if !report.is_empty() {
            warn!(failures = report.failures.len(), "user cascade incomplete; account kept for retry");
            return Err(AppError::CascadeIncomplete(report));
        }

        self.users.remove(user_id).await?;
        info!("user deleted");
        Ok(user)
    }

    /// Deactivates the account, then suspends its threads. The account flag is
    /// already committed if the thread step fails; the error still surfaces.
    #[instrument(skip(self), fields(%user_id))]
    pub async fn suspend_user(&self, user_id: Uuid) -> Result<u64> {
        let user = self.users.get(user_id).await?;
        self.users.set_active(&user, false).await?;
        self.threads.suspend_by_creator(user_id).await.inspect_err(|err| {
            warn!(error = %err, "account suspended but its threads were not");
        })
    }

    #[instrument(skip(self), fields(%user_id))]
    pub async fn unsuspend_user(&self, user_id: Uuid) -> Result<u64> {
        let user = self.users.get(user_id).await?;
        self.users.set_active(&user, true).await?;
        self.threads.unsuspend_by_creator(user_id).await.inspect_err(|err| {
            warn!(error = %err, "account reactivated but its threads are still suspended");
        })
    }

    async fn delete_profile_image(&self, url: &str) -> Result<()> {
        let name = media::filename_from_url(url)
            .ok_or_else(|| AppError::ExternalDependency(format!("cannot derive a media filename from '{url}'")))?;
        self.media.delete(PROFILE_IMAGES, name).await
    }
}

fn step<T: std::fmt::Debug>(report: &mut CascadeReport, name: CascadeStep, outcome: Result<T>) {
    match outcome {
        Ok(done) => info!(step = %name, outcome = ?done, "cascade step done"),
        Err(err) => {
            warn!(step = %name, error = %err, "cascade step failed");
            report.record(name, None, err);
        }
    }
}
