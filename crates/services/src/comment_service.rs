//! Comment Service.
//!
//! Comments may carry an image in the media store, so every deletion path has
//! two writes: the image, then the row. The single-comment path is fail-fast.
//! The bulk paths keep going: a comment whose image cannot be removed keeps its
//! row (so a retry finds it again) and the failure is reported at the end.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use domains::media::{self, MediaUpload, COMMENT_IMAGES};
use domains::{
    AppError, CascadeReport, CascadeStep, Comment, CommentRepository, MediaStore, Page, PageRequest,
    Result, ThreadRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{ensure_owner, require_text};

/// Input for a new comment or reply.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub image: Option<MediaUpload>,
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    threads: Arc<dyn ThreadRepository>,
    media: Arc<dyn MediaStore>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        threads: Arc<dyn ThreadRepository>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self { comments, threads, media }
    }

    /// Creates a comment on an existing thread. Notifying followers is the caller's job.
    pub async fn create(&self, thread_id: Uuid, author_id: Uuid, input: NewComment) -> Result<Comment> {
        let content = require_text("content", &input.content)?;
        self.require_thread(thread_id).await?;
        if let Some(parent_id) = input.parent_id {
            self.require_reply_target(thread_id, parent_id).await?;
        }

        let id = Uuid::now_v7();
        let image = match input.image.filter(|file| !file.is_empty()) {
            Some(file) => Some(self.media.upload(COMMENT_IMAGES, file, &id.to_string()).await?),
            None => None,
        };

        let now = Utc::now();
        let comment = Comment {
            id,
            thread_id,
            user_id: author_id,
            parent_id: input.parent_id,
            content,
            image,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.comments.insert(&comment).await {
            // Don't leave an orphaned upload behind a row that never landed.
            if let Some(url) = &comment.image {
                if let Err(cleanup) = self.delete_image(url).await {
                    warn!(comment_id = %id, error = %cleanup, "orphaned comment image left in media store");
                }
            }
            return Err(err);
        }

        info!(comment_id = %id, %thread_id, %author_id, reply = comment.is_reply(), "comment created");
        Ok(comment)
    }

    pub async fn get(&self, comment_id: Uuid) -> Result<Comment> {
        self.comments
            .find_by_id(comment_id)
            .await?
            .ok_or(AppError::CommentNotFound(comment_id))
    }

    /// Replaces the text, and the image when a new one is supplied.
    /// The old image is deleted before the new one is uploaded; either failure
    /// aborts before the row is written.
    pub async fn update(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
        image: Option<MediaUpload>,
    ) -> Result<Comment> {
        let mut comment = self.authorize(comment_id, author_id).await?;
        let content = require_text("content", content)?;

        if let Some(file) = image.filter(|file| !file.is_empty()) {
            if let Some(old) = &comment.image {
                self.delete_image(old).await?;
            }
            comment.image = Some(self.media.upload(COMMENT_IMAGES, file, &comment.id.to_string()).await?);
        }

        comment.content = content;
        comment.updated_at = Utc::now();
        if !self.comments.update(&comment).await? {
            return Err(AppError::CommentNotFound(comment_id));
        }

        info!(%comment_id, %author_id, "comment updated");
        Ok(comment)
    }

    /// Deletes one comment and, for a top-level comment, its replies.
    /// If the comment's own image cannot be deleted nothing is removed.
    pub async fn delete(&self, comment_id: Uuid, author_id: Uuid) -> Result<Comment> {
        let comment = self.authorize(comment_id, author_id).await?;

        if let Some(url) = &comment.image {
            self.delete_image(url).await?;
        }

        if !comment.is_reply() {
            let replies = self.comments.find_replies(&[comment.id]).await?;
            if !replies.is_empty() {
                self.purge(replies).await?;
            }
        }

        if !self.comments.delete(comment.id).await? {
            return Err(AppError::CommentNotFound(comment_id));
        }

        info!(%comment_id, %author_id, "comment deleted");
        Ok(comment)
    }

    /// Cascade for user deletion: the user's comments plus every reply to them.
    pub async fn delete_all_by_user(&self, user_id: Uuid) -> Result<u64> {
        let mut targets = self.comments.find_by_user(user_id).await?;
        let top_level: Vec<Uuid> = targets.iter().filter(|c| !c.is_reply()).map(|c| c.id).collect();
        if !top_level.is_empty() {
            let seen: HashSet<Uuid> = targets.iter().map(|c| c.id).collect();
            let replies = self.comments.find_replies(&top_level).await?;
            targets.extend(replies.into_iter().filter(|reply| !seen.contains(&reply.id)));
        }
        self.purge(targets).await
    }

    /// Cascade for thread deletion.
    pub async fn delete_all_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        let targets = self.comments.find_by_thread(thread_id).await?;
        self.purge(targets).await
    }

    pub async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        self.comments.count_by_thread(thread_id).await
    }

    pub async fn list_by_thread(&self, thread_id: Uuid, page: PageRequest) -> Result<Page<Comment>> {
        self.require_thread(thread_id).await?;
        let (items, total) = futures::try_join!(
            self.comments.find_page_by_thread(thread_id, page.skip(), page.limit),
            self.comments.count_by_thread(thread_id),
        )?;
        Ok(Page::new(items, page, total))
    }

    /// Removes images first, then the rows whose images are gone, in one bulk delete.
    /// A parent whose reply could not be cleaned is kept too, so no reply is orphaned.
    async fn purge(&self, targets: Vec<Comment>) -> Result<u64> {
        let mut report = CascadeReport::new();
        let mut kept_parents = HashSet::new();
        let mut removable = Vec::with_capacity(targets.len());

        for comment in &targets {
            if let Some(url) = &comment.image {
                if let Err(err) = self.delete_image(url).await {
                    warn!(comment_id = %comment.id, error = %err, "comment image deletion failed; keeping row");
                    report.record(CascadeStep::CommentImage, Some(comment.id), err);
                    kept_parents.extend(comment.parent_id);
                    continue;
                }
            }
            removable.push(comment.id);
        }
        removable.retain(|id| !kept_parents.contains(id));

        let deleted = if removable.is_empty() {
            0
        } else {
            self.comments.delete_many(&removable).await?
        };
        info!(deleted, failed = report.failures.len(), "comment cascade finished");

        report.into_result()?;
        Ok(deleted)
    }

    async fn delete_image(&self, url: &str) -> Result<()> {
        let name = media::filename_from_url(url)
            .ok_or_else(|| AppError::ExternalDependency(format!("cannot derive a media filename from '{url}'")))?;
        self.media.delete(COMMENT_IMAGES, name).await
    }

    /// Load + parent thread check + ownership check, shared by update and delete.
    async fn authorize(&self, comment_id: Uuid, author_id: Uuid) -> Result<Comment> {
        let comment = self.get(comment_id).await?;
        self.require_thread(comment.thread_id).await?;
        ensure_owner(author_id, comment.user_id, false, "comment")?;
        Ok(comment)
    }

    async fn require_thread(&self, thread_id: Uuid) -> Result<()> {
        match self.threads.find_by_id(thread_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::ThreadNotFound(thread_id)),
        }
    }

    /// Replies are one level deep and stay inside their thread.
    async fn require_reply_target(&self, thread_id: Uuid, parent_id: Uuid) -> Result<()> {
        let parent = self.get(parent_id).await?;
        if parent.thread_id != thread_id {
            return Err(AppError::Validation("a reply must target a comment of the same thread".into()));
        }
        if parent.is_reply() {
            return Err(AppError::Validation("replies cannot be nested".into()));
        }
        Ok(())
    }
}
