//! Bookmark Service: a user's saved threads, one bookmark per pair.

use std::sync::Arc;

use domains::{AppError, Bookmark, BookmarkRepository, Result, ThreadRepository};
use tracing::info;
use uuid::Uuid;

pub struct BookmarkService {
    bookmarks: Arc<dyn BookmarkRepository>,
    threads: Arc<dyn ThreadRepository>,
}

impl BookmarkService {
    pub fn new(bookmarks: Arc<dyn BookmarkRepository>, threads: Arc<dyn ThreadRepository>) -> Self {
        Self { bookmarks, threads }
    }

    pub async fn create(&self, user_id: Uuid, thread_id: Uuid) -> Result<Bookmark> {
        if self.threads.find_by_id(thread_id).await?.is_none() {
            return Err(AppError::ThreadNotFound(thread_id));
        }

        let bookmark = Bookmark::new(user_id, thread_id);
        if !self.bookmarks.insert_unique(&bookmark).await? {
            return Err(AppError::AlreadyBookmarked { user_id, thread_id });
        }
        info!(%user_id, %thread_id, "thread bookmarked");
        Ok(bookmark)
    }

    pub async fn is_bookmarked(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        Ok(self.bookmarks.find(user_id, thread_id).await?.is_some())
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Bookmark>> {
        self.bookmarks.find_by_user(user_id).await
    }

    pub async fn delete(&self, user_id: Uuid, thread_id: Uuid) -> Result<()> {
        if !self.bookmarks.delete(user_id, thread_id).await? {
            return Err(AppError::BookmarkNotFound { user_id, thread_id });
        }
        info!(%user_id, %thread_id, "bookmark removed");
        Ok(())
    }

    pub async fn delete_all_by_user(&self, user_id: Uuid) -> Result<u64> {
        self.bookmarks.delete_by_user(user_id).await
    }

    pub async fn delete_all_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        self.bookmarks.delete_by_thread(thread_id).await
    }

    pub async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        self.bookmarks.count_by_thread(thread_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockBookmarkRepository, MockThreadRepository};

    #[tokio::test]
    async fn bookmark_of_missing_thread_fails() {
        let mut threads = MockThreadRepository::new();
        threads.expect_find_by_id().returning(|_| Ok(None));
        let mut bookmarks = MockBookmarkRepository::new();
        bookmarks.expect_insert_unique().never();

        let svc = BookmarkService::new(Arc::new(bookmarks), Arc::new(threads));
        let err = svc.create(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::ThreadNotFound(_)));
    }

    #[tokio::test]
    async fn removing_absent_bookmark_fails() {
        let mut bookmarks = MockBookmarkRepository::new();
        bookmarks.expect_delete().returning(|_, _| Ok(false));

        let svc = BookmarkService::new(Arc::new(bookmarks), Arc::new(MockThreadRepository::new()));
        let err = svc.delete(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::BookmarkNotFound { .. }));
    }
}
