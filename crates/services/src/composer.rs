//! # Response Composer
//!
//! Builds the enriched read views. Every reference is resolved by a
//! concurrent fan-out; the first failing read aborts the whole composition so
//! a caller never sees a half-populated view. The one tolerated gap is a
//! thread whose creator account no longer exists, which renders with
//! `creator: None`.

use std::sync::Arc;

use domains::{
    Bookmark, BookmarkResponse, Comment, CommentResponse, FollowRelation, FollowResponse, LikeView, Page,
    Result, Thread, ThreadResponse, UserSummary, ViewerFlags,
};
use futures::future::try_join_all;
use uuid::Uuid;

use crate::{
    BookmarkService, CommentService, FollowService, ReportService, ThreadService, TopicService, UserService,
};

pub struct ResponseComposer {
    users: Arc<UserService>,
    topics: Arc<TopicService>,
    threads: Arc<ThreadService>,
    comments: Arc<CommentService>,
    follows: Arc<FollowService>,
    bookmarks: Arc<BookmarkService>,
    reports: Arc<ReportService>,
}

impl ResponseComposer {
    pub fn new(
        users: Arc<UserService>,
        topics: Arc<TopicService>,
        threads: Arc<ThreadService>,
        comments: Arc<CommentService>,
        follows: Arc<FollowService>,
        bookmarks: Arc<BookmarkService>,
        reports: Arc<ReportService>,
    ) -> Self {
        Self { users, topics, threads, comments, follows, bookmarks, reports }
    }

    pub async fn thread_response(&self, thread: &Thread, viewer: Option<Uuid>) -> Result<ThreadResponse> {
        let (creator, topic, likes, total_comment, total_follow, total_bookmark, total_report, flags) = futures::try_join!(
            self.users.find(thread.creator_id),
            self.topics.get(thread.topic_id),
            self.like_views(thread),
            self.comments.count_by_thread(thread.id),
            self.follows.count_by_thread(thread.id),
            self.bookmarks.count_by_thread(thread.id),
            self.reports.count_by_target(thread.id),
            self.viewer_flags(thread, viewer),
        )?;

        Ok(ThreadResponse {
            id: thread.id,
            title: thread.title.clone(),
            description: thread.description.clone(),
            topic,
            creator: creator.as_ref().map(UserSummary::from),
            total_like: thread.likes.len() as u64,
            likes,
            total_comment,
            total_follow,
            total_bookmark,
            total_report,
            viewer: flags,
            suspension: thread.suspension.clone(),
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        })
    }

    pub async fn thread_page(&self, page: Page<Thread>, viewer: Option<Uuid>) -> Result<Page<ThreadResponse>> {
        let items = try_join_all(page.items.iter().map(|thread| self.thread_response(thread, viewer))).await?;
        Ok(page.with_items(items))
    }

    pub async fn comment_response(&self, comment: &Comment) -> Result<CommentResponse> {
        let author = self.users.get(comment.user_id).await?;
        Ok(CommentResponse {
            id: comment.id,
            thread_id: comment.thread_id,
            parent_id: comment.parent_id,
            author: UserSummary::from(&author),
            content: comment.content.clone(),
            image: comment.image.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        })
    }

    pub async fn comment_page(&self, page: Page<Comment>) -> Result<Page<CommentResponse>> {
        let items = try_join_all(page.items.iter().map(|comment| self.comment_response(comment))).await?;
        Ok(page.with_items(items))
    }

    pub async fn follow_response(&self, follow: &FollowRelation) -> Result<FollowResponse> {
        let thread = self.threads.get(follow.thread_id).await?;
        let (user, thread) = futures::try_join!(
            self.users.get(follow.user_id),
            self.thread_response(&thread, Some(follow.user_id)),
        )?;
        Ok(FollowResponse {
            id: follow.id,
            user: UserSummary::from(&user),
            total_comment: thread.total_comment,
            thread,
            notification: follow.notification,
            created_at: follow.created_at,
        })
    }

    pub async fn follow_list(&self, follows: &[FollowRelation]) -> Result<Vec<FollowResponse>> {
        try_join_all(follows.iter().map(|follow| self.follow_response(follow))).await
    }

    pub async fn bookmark_response(&self, bookmark: &Bookmark) -> Result<BookmarkResponse> {
        let thread = self.threads.get(bookmark.thread_id).await?;
        let thread = self.thread_response(&thread, Some(bookmark.user_id)).await?;
        Ok(BookmarkResponse { id: bookmark.id, thread, created_at: bookmark.created_at })
    }

    pub async fn bookmark_list(&self, bookmarks: &[Bookmark]) -> Result<Vec<BookmarkResponse>> {
        try_join_all(bookmarks.iter().map(|bookmark| self.bookmark_response(bookmark))).await
    }

    // Likers are pulled from every thread when their account is deleted, so a
    // dangling like only exists mid-cascade and is skipped.
    async fn like_views(&self, thread: &Thread) -> Result<Vec<LikeView>> {
        let likers = try_join_all(thread.likes.iter().map(|like| self.users.find(like.user_id))).await?;
        Ok(thread
            .likes
            .iter()
            .zip(likers)
            .filter_map(|(like, user)| {
                user.map(|user| LikeView { user: UserSummary::from(&user), created_at: like.created_at })
            })
            .collect())
    }

    async fn viewer_flags(&self, thread: &Thread, viewer: Option<Uuid>) -> Result<Option<ViewerFlags>> {
        let Some(viewer) = viewer else {
            return Ok(None);
        };
        let (is_followed, is_bookmarked) = futures::try_join!(
            self.follows.is_following(viewer, thread.id),
            self.bookmarks.is_bookmarked(viewer, thread.id),
        )?;
        Ok(Some(ViewerFlags { is_liked: thread.is_liked_by(viewer), is_followed, is_bookmarked }))
    }
}
