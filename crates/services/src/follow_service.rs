//! FollowRelation Service: who follows which thread, and how many comments
//! they have not acknowledged yet.

use std::sync::Arc;

use domains::{AppError, FollowRelation, FollowRepository, Result, ThreadRepository, UserRepository};
use tracing::{debug, info};
use uuid::Uuid;

pub struct FollowService {
    follows: Arc<dyn FollowRepository>,
    users: Arc<dyn UserRepository>,
    threads: Arc<dyn ThreadRepository>,
}

impl FollowService {
    pub fn new(
        follows: Arc<dyn FollowRepository>,
        users: Arc<dyn UserRepository>,
        threads: Arc<dyn ThreadRepository>,
    ) -> Self {
        Self { follows, users, threads }
    }

    pub async fn create(&self, user_id: Uuid, thread_id: Uuid) -> Result<FollowRelation> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::UserNotFound(user_id));
        }
        if self.threads.find_by_id(thread_id).await?.is_none() {
            return Err(AppError::ThreadNotFound(thread_id));
        }

        let follow = FollowRelation::new(user_id, thread_id);
        if !self.follows.insert_unique(&follow).await? {
            return Err(AppError::AlreadyFollowing { user_id, thread_id });
        }
        info!(%user_id, %thread_id, "thread followed");
        Ok(follow)
    }

    pub async fn get(&self, user_id: Uuid, thread_id: Uuid) -> Result<FollowRelation> {
        self.follows
            .find(user_id, thread_id)
            .await?
            .ok_or(AppError::FollowNotFound { user_id, thread_id })
    }

    pub async fn is_following(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        Ok(self.follows.find(user_id, thread_id).await?.is_some())
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<FollowRelation>> {
        self.follows.find_by_user(user_id).await
    }

    /// Unfollow.
    pub async fn delete(&self, user_id: Uuid, thread_id: Uuid) -> Result<()> {
        if !self.follows.delete(user_id, thread_id).await? {
            return Err(AppError::FollowNotFound { user_id, thread_id });
        }
        info!(%user_id, %thread_id, "thread unfollowed");
        Ok(())
    }

    pub async fn delete_all_by_user(&self, user_id: Uuid) -> Result<u64> {
        self.follows.delete_by_user(user_id).await
    }

    pub async fn delete_all_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        self.follows.delete_by_thread(thread_id).await
    }

    /// Bumps every follower's counter by one. Whether the commenter is skipped
    /// is decided by the caller through `except`.
    pub async fn update_notification(&self, thread_id: Uuid, except: Option<Uuid>) -> Result<u64> {
        let touched = self.follows.increment_notifications(thread_id, except).await?;
        debug!(%thread_id, touched, "follower notifications incremented");
        Ok(touched)
    }

    /// The follower acknowledged the thread; their counter goes back to zero.
    pub async fn reset_notification(&self, thread_id: Uuid, user_id: Uuid) -> Result<()> {
        if !self.follows.reset_notification(user_id, thread_id).await? {
            return Err(AppError::FollowNotFound { user_id, thread_id });
        }
        Ok(())
    }

    pub async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        self.follows.count_by_thread(thread_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockFollowRepository, MockThreadRepository, MockUserRepository, Role, Thread, User};

    #[tokio::test]
    async fn duplicate_follow_conflicts() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(Some(User::new("v", "v@example.com", Role::User))));
        let mut threads = MockThreadRepository::new();
        threads
            .expect_find_by_id()
            .returning(|_| Ok(Some(Thread::new(Uuid::now_v7(), Uuid::now_v7(), "t", "d"))));
        let mut follows = MockFollowRepository::new();
        follows.expect_insert_unique().returning(|_| Ok(false));

        let svc = FollowService::new(Arc::new(follows), Arc::new(users), Arc::new(threads));
        let err = svc.create(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyFollowing { .. }));
    }

    #[tokio::test]
    async fn follow_requires_existing_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut follows = MockFollowRepository::new();
        follows.expect_insert_unique().never();

        let svc = FollowService::new(Arc::new(follows), Arc::new(users), Arc::new(MockThreadRepository::new()));
        let err = svc.create(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn reset_without_relation_is_not_found() {
        let mut follows = MockFollowRepository::new();
        follows.expect_reset_notification().returning(|_, _| Ok(false));

        let svc = FollowService::new(
            Arc::new(follows),
            Arc::new(MockUserRepository::new()),
            Arc::new(MockThreadRepository::new()),
        );
        let err = svc.reset_notification(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::FollowNotFound { .. }));
    }
}
