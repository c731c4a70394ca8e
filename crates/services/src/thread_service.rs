//! Thread Aggregate Service.
//!
//! Owns the thread lifecycle and its embedded like list. Likes are mutated with
//! the store's conditional push/pull so concurrent likers never overwrite each
//! other. Row deletion is crate-private: callers go through the coordinator,
//! which runs the cascade first.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    AppError, ArrayMutation, Like, Page, PageRequest, Result, Suspension, Thread, ThreadChanges,
    ThreadFilter, ThreadRepository, ThreadSort, TopicRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{ensure_owner, require_text};

pub struct ThreadService {
    threads: Arc<dyn ThreadRepository>,
    topics: Arc<dyn TopicRepository>,
}

impl ThreadService {
    pub fn new(threads: Arc<dyn ThreadRepository>, topics: Arc<dyn TopicRepository>) -> Self {
        Self { threads, topics }
    }

    pub async fn create(&self, creator_id: Uuid, topic_id: Uuid, title: &str, description: &str) -> Result<Thread> {
        let title = require_text("title", title)?;
        let description = require_text("description", description)?;
        self.require_topic(topic_id).await?;

        let thread = Thread::new(creator_id, topic_id, title, description);
        self.threads.insert(&thread).await?;

        info!(thread_id = %thread.id, %creator_id, %topic_id, "thread created");
        Ok(thread)
    }

    pub async fn get(&self, thread_id: Uuid) -> Result<Thread> {
        self.threads
            .find_by_id(thread_id)
            .await?
            .ok_or(AppError::ThreadNotFound(thread_id))
    }

    /// Applies the mutable fields. Only the creator, or an admin, may do this.
    /// A suspension change is honoured for admins only.
    pub async fn update(&self, actor_id: Uuid, thread_id: Uuid, changes: ThreadChanges, is_admin: bool) -> Result<Thread> {
        let mut thread = self.get(thread_id).await?;
        self.require_topic(changes.topic_id).await?;
        ensure_owner(actor_id, thread.creator_id, is_admin, "thread")?;
        if changes.suspension.is_some() && !is_admin {
            return Err(AppError::NotOwner { actor_id, resource: "thread suspension" });
        }

        let changes = ThreadChanges {
            topic_id: changes.topic_id,
            title: require_text("title", &changes.title)?,
            description: require_text("description", &changes.description)?,
            suspension: changes.suspension,
        };
        let now = Utc::now();
        if !self.threads.update_content(thread_id, &changes, now).await? {
            // Deleted between the load and the write.
            return Err(AppError::ThreadNotFound(thread_id));
        }

        if let Some(change) = &changes.suspension {
            thread.suspension = change.resolve();
            info!(%thread_id, %actor_id, suspended = thread.is_suspended(), "thread suspension changed");
        }
        thread.topic_id = changes.topic_id;
        thread.title = changes.title;
        thread.description = changes.description;
        thread.updated_at = now;

        info!(%thread_id, %actor_id, is_admin, "thread updated");
        Ok(thread)
    }

    /// Loads the thread and applies the ownership check shared by update and delete.
    /// Returns the snapshot the caller is about to mutate.
    pub async fn authorize_mutation(&self, actor_id: Uuid, thread_id: Uuid, is_admin: bool) -> Result<Thread> {
        let thread = self.get(thread_id).await?;
        ensure_owner(actor_id, thread.creator_id, is_admin, "thread")?;
        Ok(thread)
    }

    /// Deletes the thread row only. The dependent collections must already be clean.
    pub(crate) async fn remove(&self, thread_id: Uuid) -> Result<()> {
        if !self.threads.delete(thread_id).await? {
            return Err(AppError::ThreadNotFound(thread_id));
        }
        Ok(())
    }

    pub async fn like(&self, user_id: Uuid, thread_id: Uuid) -> Result<()> {
        match self.threads.push_like(thread_id, Like::now(user_id)).await? {
            ArrayMutation::Applied => {
                debug!(%thread_id, %user_id, "like added");
                Ok(())
            }
            ArrayMutation::Unchanged => Err(AppError::AlreadyLiked { user_id, thread_id }),
            ArrayMutation::Missing => Err(AppError::ThreadNotFound(thread_id)),
        }
    }

    pub async fn unlike(&self, user_id: Uuid, thread_id: Uuid) -> Result<()> {
        match self.threads.pull_like(thread_id, user_id).await? {
            ArrayMutation::Applied => {
                debug!(%thread_id, %user_id, "like removed");
                Ok(())
            }
            ArrayMutation::Unchanged => Err(AppError::NotLiked { user_id, thread_id }),
            ArrayMutation::Missing => Err(AppError::ThreadNotFound(thread_id)),
        }
    }

    /// Bulk-suspends every thread of `creator_id`. Not atomic with the account flag.
    pub async fn suspend_by_creator(&self, creator_id: Uuid) -> Result<u64> {
        let touched = self
            .threads
            .set_suspension_by_creator(creator_id, Some(Suspension::creator_suspended()), Utc::now())
            .await?;
        info!(%creator_id, touched, "threads suspended");
        Ok(touched)
    }

    pub async fn unsuspend_by_creator(&self, creator_id: Uuid) -> Result<u64> {
        let touched = self
            .threads
            .set_suspension_by_creator(creator_id, None, Utc::now())
            .await?;
        info!(%creator_id, touched, "threads unsuspended");
        Ok(touched)
    }

    pub(crate) async fn pull_likes_by_user(&self, user_id: Uuid) -> Result<u64> {
        self.threads.pull_likes_by_user(user_id).await
    }

    /// One bounded query for the page, one count-only query for the total.
    pub async fn paginate(&self, filter: &ThreadFilter, sort: ThreadSort, page: PageRequest) -> Result<Page<Thread>> {
        let (items, total) = futures::try_join!(
            self.threads.find_page(filter, sort, page.skip(), page.limit),
            self.threads.count(filter),
        )?;
        Ok(Page::new(items, page, total))
    }

    async fn require_topic(&self, topic_id: Uuid) -> Result<()> {
        match self.topics.find_by_id(topic_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::TopicNotFound(topic_id)),
        }
    }
}
